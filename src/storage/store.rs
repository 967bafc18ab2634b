//! On-disk file store
//!
//! Flat layout under one data root; filenames are percent-encoded before
//! they become path components so a name can never escape the root.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{encode_filename, Result};

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open or create the store root
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        tracing::info!("FileStore opened at {}", root.display());
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Destination path for a filename
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(encode_filename(filename))
    }

    /// Persist file bytes, overwriting any existing file
    pub fn write(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(filename);
        fs::write(&path, bytes)?;
        tracing::info!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Read file bytes, None if absent
    pub fn read(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(filename);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a file. Returns whether it existed.
    pub fn delete(&self, filename: &str) -> Result<bool> {
        let path = self.path_for(filename);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path_for(filename).exists()
    }
}
