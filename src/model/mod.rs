//! Core data types for lock files, advisories, and audit results.
//!
//! This module contains the fundamental types used throughout lockaudit:
//!
//! - [`LockFile`] / [`InstalledPackage`] - parsed `composer.lock` data
//! - [`Advisory`] / [`AdvisoryBranch`] - one security advisory record
//! - [`AdvisoryIndex`] - package name to advisories mapping
//! - [`AuditReport`] - the result of one audit
//!
//! # Example
//!
//! ```
//! use lockaudit::{InstalledPackage, LockFile};
//!
//! let lock = LockFile {
//!     packages: vec![InstalledPackage::new("league/flysystem", "1.0.70")],
//!     packages_dev: Vec::new(),
//! };
//!
//! println!("{} packages installed", lock.packages.len());
//! ```

mod advisory;
mod package;
mod report;

pub use advisory::*;
pub use package::*;
pub use report::*;
