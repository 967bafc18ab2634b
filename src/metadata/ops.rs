//! Store adapters for the metadata node's 2PC participant

use std::sync::Arc;

use crate::common::Result;
use crate::twopc::envelope::{OperationPayload, OP_DELETE, OP_UPLOAD};
use crate::twopc::participant::{missing_field, OpHandler, StagedOp};

use super::store::{FileRecord, MetadataStore};

/// Stages uploads: the record is parsed and validated at vote time,
/// inserted at commit time.
pub struct UploadOp {
    store: Arc<MetadataStore>,
}

impl UploadOp {
    pub fn new(store: Arc<MetadataStore>) -> Self {
        Self { store }
    }
}

struct StagedUpload {
    store: Arc<MetadataStore>,
    record: FileRecord,
}

impl StagedOp for StagedUpload {
    fn apply(&self) -> Result<()> {
        self.store.put_file(self.record.clone());
        tracing::info!("metadata record applied for {}", self.record.filename);
        Ok(())
    }
}

impl OpHandler for UploadOp {
    fn kind(&self) -> &str {
        OP_UPLOAD
    }

    fn stage(&self, payload: &OperationPayload) -> Result<Box<dyn StagedOp>> {
        let record: FileRecord = payload.metadata()?;
        if record.filename.is_empty() {
            return Err(missing_field("filename"));
        }
        Ok(Box::new(StagedUpload {
            store: self.store.clone(),
            record,
        }))
    }
}

/// Stages record deletions; a missing record at apply time is not an error.
pub struct DeleteOp {
    store: Arc<MetadataStore>,
}

impl DeleteOp {
    pub fn new(store: Arc<MetadataStore>) -> Self {
        Self { store }
    }
}

struct StagedDelete {
    store: Arc<MetadataStore>,
    filename: String,
}

impl StagedOp for StagedDelete {
    fn apply(&self) -> Result<()> {
        let existed = self.store.delete_file(&self.filename);
        tracing::info!(
            "metadata record removed for {} (existed: {})",
            self.filename,
            existed
        );
        Ok(())
    }
}

impl OpHandler for DeleteOp {
    fn kind(&self) -> &str {
        OP_DELETE
    }

    fn stage(&self, payload: &OperationPayload) -> Result<Box<dyn StagedOp>> {
        let record: FileRecord = payload.metadata()?;
        if record.filename.is_empty() {
            return Err(missing_field("filename"));
        }
        Ok(Box::new(StagedDelete {
            store: self.store.clone(),
            filename: record.filename,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twopc::envelope::OperationPayload;
    use serde_json::json;

    #[test]
    fn test_upload_stage_does_not_insert() {
        let store = Arc::new(MetadataStore::new());
        let handler = UploadOp::new(store.clone());

        let payload = OperationPayload::from_metadata(
            &json!({"filename": "a.txt", "size": 11, "version": 1}),
        )
        .unwrap();
        let staged = handler.stage(&payload).unwrap();
        assert!(store.get_file("a.txt").is_none());

        staged.apply().unwrap();
        let record = store.get_file("a.txt").unwrap();
        assert_eq!(record.size, 11);
    }

    #[test]
    fn test_upload_stage_rejects_malformed_json() {
        let handler = UploadOp::new(Arc::new(MetadataStore::new()));
        let payload = OperationPayload {
            metadata_json: "{not json".to_string(),
            file_data: String::new(),
        };
        assert!(handler.stage(&payload).is_err());
    }

    #[test]
    fn test_delete_removes_record() {
        let store = Arc::new(MetadataStore::new());
        store.put_file(FileRecord {
            filename: "a.txt".to_string(),
            path: String::new(),
            size: 0,
            version: 1,
            checksum: String::new(),
            user: None,
        });

        let handler = DeleteOp::new(store.clone());
        let payload = OperationPayload::from_metadata(&json!({"filename": "a.txt"})).unwrap();
        handler.stage(&payload).unwrap().apply().unwrap();
        assert!(store.get_file("a.txt").is_none());
    }
}
