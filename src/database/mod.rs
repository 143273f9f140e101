//! Advisory database collaborators.
//!
//! The matching core never talks to the network or the filesystem; it
//! consumes a finalized [`AdvisoryIndex`] built by an [`AdvisorySource`].
//! Two collaborators are provided:
//!
//! - [`DatabaseFetcher`] downloads the advisory database as a single zip
//!   archive and maintains a local cache of its records.
//! - [`FilesystemSource`] scans a directory of YAML advisory records
//!   (the cache directory, or any checkout of the database) into an
//!   index.

mod fetch;
mod filesystem;

pub use fetch::{DatabaseFetcher, DEFAULT_DATABASE_URL};
pub use filesystem::FilesystemSource;

use crate::error::Result;
use crate::model::AdvisoryIndex;
use async_trait::async_trait;

/// Supplies a finalized advisory index snapshot.
///
/// The auditor is agnostic to how the snapshot was produced: archive
/// download, local directory scan, or an in-memory fixture in tests.
#[async_trait]
pub trait AdvisorySource: Send + Sync {
    /// Builds the complete package-to-advisories mapping.
    async fn load(&self) -> Result<AdvisoryIndex>;
}
