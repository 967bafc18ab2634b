//! Transaction envelope: the operation a transaction carries
//!
//! The coordinator treats the payload as opaque bytes-and-JSON; only the
//! participants decode it, during staging.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::Result;

/// Operation kind for file uploads
pub const OP_UPLOAD: &str = "upload";

/// Operation kind for file deletions
pub const OP_DELETE: &str = "delete";

/// Generate a fresh transaction id. Unique per logical operation, never
/// reused; used as the correlation key across the vote and decision rounds.
pub fn new_transaction_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// An operation to run transactionally across all participants.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    /// Kind tag dispatched by each participant ("upload", "delete", ...)
    pub kind: String,
    /// Payload, opaque to the coordinator
    pub payload: OperationPayload,
}

impl OperationDescriptor {
    pub fn new(kind: impl Into<String>, payload: OperationPayload) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// Wire-level operation payload: structured fields as JSON plus optional
/// base64-encoded binary content.
#[derive(Debug, Clone, Default)]
pub struct OperationPayload {
    /// JSON-encoded structured fields (filename, size, ...)
    pub metadata_json: String,
    /// Base64-encoded file bytes; empty when the operation carries none
    pub file_data: String,
}

impl OperationPayload {
    /// Build a payload from structured fields, without binary content.
    pub fn from_metadata<T: Serialize>(metadata: &T) -> Result<Self> {
        Ok(Self {
            metadata_json: serde_json::to_string(metadata)?,
            file_data: String::new(),
        })
    }

    /// Build a payload from structured fields plus file bytes.
    pub fn with_file<T: Serialize>(metadata: &T, bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            metadata_json: serde_json::to_string(metadata)?,
            file_data: BASE64.encode(bytes),
        })
    }

    /// Decode the structured fields. Called by participants while staging.
    pub fn metadata<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.metadata_json)?)
    }

    /// Decode the binary content. Called by participants while staging.
    pub fn decode_file(&self) -> Result<Vec<u8>> {
        Ok(BASE64.decode(&self.file_data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_roundtrip() {
        let payload =
            OperationPayload::with_file(&json!({"filename": "a.txt", "size": 11}), b"hello world")
                .unwrap();

        let meta: serde_json::Value = payload.metadata().unwrap();
        assert_eq!(meta["filename"], "a.txt");
        assert_eq!(payload.decode_file().unwrap(), b"hello world");
    }

    #[test]
    fn test_malformed_base64_rejected() {
        let payload = OperationPayload {
            metadata_json: "{}".to_string(),
            file_data: "!!not base64!!".to_string(),
        };
        assert!(payload.decode_file().is_err());
    }

    #[test]
    fn test_transaction_ids_unique() {
        assert_ne!(new_transaction_id(), new_transaction_id());
    }
}
