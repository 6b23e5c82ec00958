//! Core library for jscdasm.
//!
//! Recovers disassembly from a V8 code cache blob that the engine would
//! normally refuse to load: the validated header fields (version hash,
//! source hash, flag hash) are re-stamped with values harvested from the
//! running engine build, and the patched blob is replayed through the
//! consume-code-cache compile path so the engine disassembles the payload
//! itself.
//!
//! The crate splits into an engine-free data layer ([`format`]) and the
//! layer that drives the embedded engine ([`engine`]).

pub mod engine;
pub mod error;
pub mod format;

pub use error::{Error, Result};
