//! Media storage for generated illustrations.
//!
//! Backends implement [`MediaStorage`]:
//! - [`GcsStorage`] uploads to a Cloud Storage bucket and hands out public URLs
//! - [`FileSystemStorage`] keeps content-addressed files on local disk
//!
//! # Example
//!
//! ```rust
//! use storygen_storage::{FileSystemStorage, MediaStorage, MediaMetadata, MediaType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/media")?
//!     .with_public_base_url("http://localhost:8000/media");
//! let metadata = MediaMetadata::png(None);
//!
//! let data = vec![0u8; 1024];
//! let reference = storage.store(&data, &metadata).await?;
//! let url = storage.get_url(&reference).await?;
//! assert!(url.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod filesystem;
mod gcs;
mod media_type;
mod metadata;
mod reference;
mod storage;

pub use blob::{blob_name, safe_prompt_fragment};
pub use filesystem::FileSystemStorage;
pub use gcs::{GcsStorage, PUBLIC_STORAGE_HOST};
pub use media_type::MediaType;
pub use metadata::MediaMetadata;
pub use reference::MediaReference;
pub use storage::MediaStorage;
pub use storygen_error::{StorageError, StorageErrorKind};
