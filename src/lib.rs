pub mod audit;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod model;
pub mod output;
pub mod version;

pub use audit::Auditor;
pub use config::Config;
pub use database::{AdvisorySource, DatabaseFetcher, FilesystemSource};
pub use error::AuditError;
pub use model::{
    Advisory, AdvisoryBranch, AdvisoryIndex, AdvisorySummary, AuditReport, InstalledPackage,
    LockFile, PackageAdvisories,
};
