//! HTTP surface of the filestore service.
//!
//! Issues short-lived, permission-scoped URLs for uploading and downloading
//! user files, validates uploaded objects, and records ownership metadata.
//! File bytes never pass through this service; all transfer happens
//! client-to-storage via presigned grants.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
