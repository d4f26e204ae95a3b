//! Videostore Storage Library
//!
//! This crate provides the [`VideoStore`] abstraction and its backends.
//!
//! # Record layout
//!
//! Every backend exposes the same record shape: one record per [`VideoId`], made of a
//! video file named `video` plus the extension of the uploaded file, and a
//! `metadata.json` document. The filesystem backend maps this one-to-one onto disk:
//!
//! ```text
//! <root>/
//!   .staging/<id>/...   uploads being assembled, never listed
//!   <id>/video.<ext>
//!   <id>/metadata.json
//! ```
//!
//! Uploads are staged first and published by [`VideoStore::commit`], so a record is
//! either fully visible or not visible at all.
//!
//! [`VideoId`]: videostore_core::VideoId

pub mod factory;
pub mod layout;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_store;
#[cfg(feature = "storage-local")]
pub use local::LocalVideoStore;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryVideoStore;
pub use traits::{StorageError, StorageResult, VideoBlob, VideoReader, VideoStore};
pub use videostore_core::StorageBackend;
