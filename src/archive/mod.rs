// src/archive/mod.rs

//! Artifact archival for successful runs.
//!
//! Archival is best-effort: a failure here is logged and never turns a
//! finished run into a failed one. See [`archive_best_effort`].

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

pub mod bundle;
pub mod store;

pub use bundle::{ArchiveBundle, BundleFile, MetaValue};
pub use store::{compute_file_hash, Archiver, DirectoryArchiver, MANIFEST_FILE};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("invalid archive key {0:?}")]
    InvalidKey(String),

    #[error("bundle {0:?} already exists")]
    AlreadyExists(String),

    #[error("archiving {name} from {}: {source}", path.display())]
    Copy {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing manifest: {0}")]
    Manifest(#[from] toml::ser::Error),
}

/// Archive `bundle`, logging instead of failing.
pub fn archive_best_effort(archiver: &dyn Archiver, bundle: &ArchiveBundle) -> Option<PathBuf> {
    match archiver.archive(bundle) {
        Ok(dir) => Some(dir),
        Err(err) => {
            warn!(key = bundle.key(), error = %err, "archival failed; run result is unaffected");
            None
        }
    }
}
