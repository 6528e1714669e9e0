pub mod upload_validation;
