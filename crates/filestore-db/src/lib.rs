//! Database repositories for the filestore service.

pub mod file_store;
pub mod test_helpers;

pub use file_store::{FileRecord, FileRepository, FileStoreRepository};
