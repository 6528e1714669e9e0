//! Mock repository implementation for testing
//!
//! Implements [`FileRepository`] over an in-memory table so handler flows
//! can be tested without a database. The unique-key behavior of the real
//! `userfilestore` index is reproduced in `insert`.

use crate::file_store::{FileRecord, FileRepository};
use async_trait::async_trait;
use chrono::Utc;
use filestore_core::AppError;
use std::sync::{Arc, Mutex};

/// In-memory mock of [`FileRepository`].
#[derive(Default, Clone)]
pub struct InMemoryFileRepository {
    records: Arc<Mutex<Vec<FileRecord>>>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the uniqueness check.
    pub fn seed(
        &self,
        user_id: &str,
        file_key: &str,
        file_category: &str,
        file_content_type: &str,
        original_file_name: &str,
    ) -> FileRecord {
        let mut records = self.records.lock().unwrap();
        let record = build_record(
            next_id(&records),
            user_id,
            file_key,
            file_category,
            file_content_type,
            original_file_name,
        );
        records.push(record.clone());
        record
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

fn next_id(records: &[FileRecord]) -> i64 {
    records.iter().map(|r| r.id).max().unwrap_or(0) + 1
}

fn build_record(
    id: i64,
    user_id: &str,
    file_key: &str,
    file_category: &str,
    file_content_type: &str,
    original_file_name: &str,
) -> FileRecord {
    let now = Utc::now();
    FileRecord {
        id,
        user_id: user_id.to_string(),
        file_key: file_key.to_string(),
        file_category: file_category.to_string(),
        file_content_type: file_content_type.to_string(),
        original_file_name: original_file_name.to_string(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn insert(
        &self,
        user_id: &str,
        file_key: &str,
        file_category: &str,
        file_content_type: &str,
        original_file_name: &str,
    ) -> Result<FileRecord, AppError> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.file_key == file_key) {
            return Err(AppError::Conflict("File already registered.".to_string()));
        }
        let record = build_record(
            next_id(&records),
            user_id,
            file_key,
            file_category,
            file_content_type,
            original_file_name,
        );
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_owner_and_key(
        &self,
        user_id: &str,
        file_key: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.file_key == file_key)
            .cloned())
    }

    async fn find_by_id_for_owner(
        &self,
        id: i64,
        user_id: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
