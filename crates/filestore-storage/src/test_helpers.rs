//! Mock ObjectStorage implementation for testing
//!
//! Stores objects in memory and records every storage operation so tests
//! can assert which calls a flow performed (or that it performed none).

use crate::traits::{ObjectHead, ObjectStorage, PresignedPost, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory mock of [`ObjectStorage`].
#[derive(Default)]
pub struct MockObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    operations: Arc<Mutex<Vec<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object into the mock store.
    pub fn put_object(&self, key: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }

    pub fn has_object(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// All operations performed so far, as "op key" strings.
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    fn record(&self, op: &str, key: &str) {
        self.operations.lock().unwrap().push(format!("{} {}", op, key));
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStore {
    async fn head(&self, key: &str) -> StorageResult<ObjectHead> {
        self.record("head", key);
        let objects = self.objects.lock().unwrap();
        match objects.get(key) {
            Some(data) => Ok(ObjectHead {
                content_length: data.len() as u64,
            }),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn read_prefix(&self, key: &str, max_bytes: u64) -> StorageResult<Bytes> {
        self.record("read_prefix", key);
        let objects = self.objects.lock().unwrap();
        match objects.get(key) {
            Some(data) => {
                let end = (max_bytes as usize).min(data.len());
                Ok(Bytes::copy_from_slice(&data[..end]))
            }
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.record("delete", key);
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presigned_download_url(
        &self,
        key: &str,
        _content_type: &str,
        _original_file_name: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        self.record("presign_get", key);
        Ok(format!("https://mock.example/{}", key))
    }

    async fn presigned_upload_post(
        &self,
        key: &str,
        _max_size_bytes: u64,
        _expires_in: Duration,
    ) -> StorageResult<PresignedPost> {
        self.record("presign_post", key);
        Ok(PresignedPost {
            url: "https://mock.example".to_string(),
            fields: serde_json::json!({ "key": key }),
        })
    }
}
