//! Object-storage abstraction for the filestore service.
//!
//! The [`ObjectStorage`] trait covers exactly the operations the upload and
//! download flows need: head, ranged read, delete, and the two presigned
//! grants. The S3 implementation signs browser POST policies by hand in
//! [`post_policy`] because the AWS SDK only presigns single requests.

pub mod post_policy;
pub mod s3;
pub mod test_helpers;
pub mod traits;

pub use s3::S3Storage;
pub use traits::{ObjectHead, ObjectStorage, PresignedPost, StorageError, StorageResult};
