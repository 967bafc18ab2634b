//! Store adapters for the storage node's 2PC participant
//!
//! Staging decodes and validates everything up front; apply only touches
//! the disk.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::common::Result;
use crate::twopc::envelope::{OperationPayload, OP_DELETE, OP_UPLOAD};
use crate::twopc::participant::{missing_field, OpHandler, StagedOp};

use super::store::FileStore;

#[derive(Deserialize)]
struct FileFields {
    filename: Option<String>,
}

fn required_filename(payload: &OperationPayload) -> Result<String> {
    let fields: FileFields = payload.metadata()?;
    match fields.filename {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(missing_field("filename")),
    }
}

/// Stages uploads: bytes decoded and destination computed at vote time,
/// written at commit time.
pub struct UploadOp {
    store: Arc<FileStore>,
}

impl UploadOp {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }
}

struct StagedUpload {
    store: Arc<FileStore>,
    filename: String,
    save_path: PathBuf,
    bytes: Vec<u8>,
}

impl StagedOp for StagedUpload {
    fn apply(&self) -> Result<()> {
        self.store.write(&self.filename, &self.bytes)?;
        tracing::info!(
            "upload applied: {} ({} bytes) at {}",
            self.filename,
            self.bytes.len(),
            self.save_path.display()
        );
        Ok(())
    }
}

impl OpHandler for UploadOp {
    fn kind(&self) -> &str {
        OP_UPLOAD
    }

    fn stage(&self, payload: &OperationPayload) -> Result<Box<dyn StagedOp>> {
        let filename = required_filename(payload)?;
        let bytes = payload.decode_file()?;
        let save_path = self.store.path_for(&filename);
        Ok(Box::new(StagedUpload {
            store: self.store.clone(),
            filename,
            save_path,
            bytes,
        }))
    }
}

/// Stages deletions; a missing file at apply time is not an error.
pub struct DeleteOp {
    store: Arc<FileStore>,
}

impl DeleteOp {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }
}

struct StagedDelete {
    store: Arc<FileStore>,
    filename: String,
}

impl StagedOp for StagedDelete {
    fn apply(&self) -> Result<()> {
        let existed = self.store.delete(&self.filename)?;
        tracing::info!("delete applied: {} (existed: {})", self.filename, existed);
        Ok(())
    }
}

impl OpHandler for DeleteOp {
    fn kind(&self) -> &str {
        OP_DELETE
    }

    fn stage(&self, payload: &OperationPayload) -> Result<Box<dyn StagedOp>> {
        let filename = required_filename(payload)?;
        Ok(Box::new(StagedDelete {
            store: self.store.clone(),
            filename,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twopc::envelope::OperationPayload;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_upload_stage_does_not_write() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let handler = UploadOp::new(store.clone());

        let payload =
            OperationPayload::with_file(&json!({"filename": "a.txt"}), b"hello").unwrap();
        let staged = handler.stage(&payload).unwrap();
        assert!(!store.exists("a.txt"));

        staged.apply().unwrap();
        assert_eq!(store.read("a.txt").unwrap().unwrap(), b"hello");
    }

    #[test]
    fn test_upload_stage_rejects_missing_filename() {
        let dir = TempDir::new().unwrap();
        let handler = UploadOp::new(Arc::new(FileStore::open(dir.path()).unwrap()));

        let payload = OperationPayload::with_file(&json!({"size": 5}), b"hello").unwrap();
        assert!(handler.stage(&payload).is_err());
    }

    #[test]
    fn test_upload_stage_rejects_bad_base64() {
        let dir = TempDir::new().unwrap();
        let handler = UploadOp::new(Arc::new(FileStore::open(dir.path()).unwrap()));

        let payload = OperationPayload {
            metadata_json: json!({"filename": "a.txt"}).to_string(),
            file_data: "***".to_string(),
        };
        assert!(handler.stage(&payload).is_err());
    }

    #[test]
    fn test_delete_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let handler = DeleteOp::new(Arc::new(FileStore::open(dir.path()).unwrap()));

        let payload = OperationPayload::from_metadata(&json!({"filename": "gone.txt"})).unwrap();
        handler.stage(&payload).unwrap().apply().unwrap();
    }
}
