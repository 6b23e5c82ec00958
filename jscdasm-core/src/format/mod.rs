//! Engine-free data model: cache blobs and the validated header layout.

pub mod cache;

pub use cache::{CacheBlob, HeaderSchema};
