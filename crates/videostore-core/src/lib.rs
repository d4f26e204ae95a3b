//! Videostore Core Library
//!
//! This crate provides the domain models, error types, configuration and layout
//! constants shared by the storage backends and the HTTP API.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{StoredVideo, UploadResponse, VideoEntry, VideoId, VideoSummary};
pub use storage_types::StorageBackend;
