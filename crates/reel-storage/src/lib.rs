//! Edge storage client.
//!
//! This crate provides:
//! - File upload to a storage zone over HTTP PUT
//! - Public CDN URL construction for uploaded objects
//! - Remote path encoding

pub mod client;
pub mod error;

pub use client::{encode_remote_path, EdgeStorageClient, EdgeStorageConfig};
pub use error::{StorageError, StorageResult};
