// src/archive/store.rs

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::bundle::{ArchiveBundle, MetaValue};
use super::ArchiveError;

/// Name of the manifest written into every bundle directory.
pub const MANIFEST_FILE: &str = "index.toml";

/// Persists bundles somewhere.
pub trait Archiver {
    /// Save `bundle`; returns where it ended up.
    fn archive(&self, bundle: &ArchiveBundle) -> Result<PathBuf, ArchiveError>;
}

/// Stores each bundle as `<root>/<key>/` with a TOML manifest.
#[derive(Debug, Clone)]
pub struct DirectoryArchiver {
    root: PathBuf,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    key: &'a str,
    files: Vec<ManifestFile<'a>>,
    metadata: &'a BTreeMap<String, MetaValue>,
}

#[derive(Debug, Serialize)]
struct ManifestFile<'a> {
    name: &'a str,
    description: &'a str,
    bytes: u64,
    blake3: String,
}

impl DirectoryArchiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store(&self, bundle: &ArchiveBundle, dir: &Path) -> Result<(), ArchiveError> {
        let mut entries = Vec::with_capacity(bundle.files().len());

        for (name, file) in bundle.files() {
            let dest = dir.join(name);
            let bytes = fs::copy(&file.source, &dest).map_err(|source| ArchiveError::Copy {
                name: name.clone(),
                path: file.source.clone(),
                source,
            })?;
            let digest = compute_file_hash(&dest).map_err(|source| ArchiveError::Copy {
                name: name.clone(),
                path: dest.clone(),
                source,
            })?;
            debug!(file = %name, bytes, "archived file");

            entries.push(ManifestFile {
                name,
                description: &file.description,
                bytes,
                blake3: digest,
            });
        }

        let manifest = Manifest {
            key: bundle.key(),
            files: entries,
            metadata: bundle.metadata(),
        };
        let text = toml::to_string(&manifest)?;
        fs::write(dir.join(MANIFEST_FILE), text).map_err(|source| ArchiveError::Io {
            path: dir.join(MANIFEST_FILE),
            source,
        })?;
        Ok(())
    }
}

impl Archiver for DirectoryArchiver {
    fn archive(&self, bundle: &ArchiveBundle) -> Result<PathBuf, ArchiveError> {
        validate_key(bundle.key())?;

        fs::create_dir_all(&self.root).map_err(|source| ArchiveError::Io {
            path: self.root.clone(),
            source,
        })?;

        let dir = self.root.join(bundle.key());
        // `create_dir` (not `_all`) so an existing bundle is never touched.
        fs::create_dir(&dir).map_err(|source| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                ArchiveError::AlreadyExists(bundle.key().to_string())
            } else {
                ArchiveError::Io {
                    path: dir.clone(),
                    source,
                }
            }
        })?;

        if let Err(err) = self.store(bundle, &dir) {
            if let Err(e) = fs::remove_dir_all(&dir) {
                warn!(dir = %dir.display(), error = %e, "failed to remove partial bundle");
            }
            return Err(err);
        }

        info!(
            key = bundle.key(),
            dir = %dir.display(),
            files = bundle.files().len(),
            "run archived"
        );
        Ok(dir)
    }
}

/// A key must be usable as exactly one directory name.
fn validate_key(key: &str) -> Result<(), ArchiveError> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\'])
        || key.chars().any(char::is_control);
    if bad {
        Err(ArchiveError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// blake3 digest of a file, hex encoded.
pub fn compute_file_hash(path: &Path) -> std::io::Result<String> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
