//! Filesystem-backed storage for relayed videos.
//!
//! A video is addressed by a `(schema, worker_id)` pair and lives at
//! `{base_dir}/{schema}/{schema}_w_{worker_id}_full.mp4`.

pub mod address;
pub mod local_store;
pub mod store;

pub use address::{address_for, file_name_for, VideoKey};
pub use local_store::LocalFileBlobStore;
pub use store::{BlobStore, StagedBlob, StoreError, StoreResult, StoredVideo};
