use thiserror::Error;

/// Errors of the patch-and-consume pipeline.
///
/// No variant is retryable: every failure stems from a structural mismatch
/// (wrong offsets, wrong flags, broken engine binding) that a retry cannot
/// resolve.
#[derive(Debug, Error)]
pub enum Error {
    /// The oracle could not compile or serialize the placeholder script.
    /// The engine binding itself is unusable.
    #[error("engine setup failed: {0}")]
    Setup(String),

    /// Target blob too short to hold the validated header range.
    #[error("cache blob is {len} bytes, need at least {min} for the header range")]
    TruncatedBlob { len: usize, min: usize },

    /// Reference header length does not match the schema it was harvested
    /// for.
    #[error("reference header is {got} bytes, schema expects {want}")]
    HeaderLength { got: usize, want: usize },

    /// The engine declined the patched blob: wrong header offsets for this
    /// engine build, a corrupt payload, or codegen flags that differ from
    /// the producing build.
    #[error("engine rejected the patched code cache")]
    CacheRejected,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
