//! In-memory metadata store
//!
//! Two tables behind read-write locks: file records keyed by filename, and
//! user records keyed by username. The 2PC participant and the HTTP layer
//! share the store through `Arc`, never through a raw map reference.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// Metadata record for one stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default = "default_version")]
    pub version: u32,
    /// blake3 hex digest of the file bytes
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub user: Option<String>,
}

fn default_version() -> u32 {
    1
}

/// One user account; the password is an argon2 hash, never plaintext
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
}

#[derive(Default)]
pub struct MetadataStore {
    files: RwLock<HashMap<String, FileRecord>>,
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === File operations ===

    /// Insert or overwrite a file record
    pub fn put_file(&self, record: FileRecord) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(record.filename.clone(), record);
    }

    pub fn get_file(&self, filename: &str) -> Option<FileRecord> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(filename).cloned()
    }

    /// Remove a file record. Returns whether it existed.
    pub fn delete_file(&self, filename: &str) -> bool {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(filename).is_some()
    }

    pub fn list_files(&self) -> Vec<FileRecord> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.values().cloned().collect()
    }

    pub fn file_count(&self) -> usize {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.len()
    }

    // === User operations ===

    /// Create a user; fails if the username is taken
    pub fn put_user(&self, record: UserRecord) -> Result<()> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.contains_key(&record.username) {
            return Err(Error::AlreadyExists(record.username));
        }
        users.insert(record.username.clone(), record);
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Option<UserRecord> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        users.get(username).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            filename: name.to_string(),
            path: format!("/storage/{}", name),
            size: 11,
            version: 1,
            checksum: String::new(),
            user: Some("alice".to_string()),
        }
    }

    #[test]
    fn test_file_crud() {
        let store = MetadataStore::new();

        store.put_file(record("a.txt"));
        assert_eq!(store.get_file("a.txt").unwrap().size, 11);
        assert_eq!(store.list_files().len(), 1);

        // Upsert overwrites
        let mut updated = record("a.txt");
        updated.version = 2;
        store.put_file(updated);
        assert_eq!(store.get_file("a.txt").unwrap().version, 2);

        assert!(store.delete_file("a.txt"));
        assert!(!store.delete_file("a.txt"));
        assert!(store.get_file("a.txt").is_none());
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let store = MetadataStore::new();
        let user = UserRecord {
            username: "alice".to_string(),
            password: "hash".to_string(),
        };

        store.put_user(user.clone()).unwrap();
        assert!(matches!(
            store.put_user(user),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(store.get_user("alice").unwrap().password, "hash");
    }
}
