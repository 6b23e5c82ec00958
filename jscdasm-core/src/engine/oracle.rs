//! Hash oracle: compile a throwaway script under the live session to
//! harvest header bytes that are valid for the running engine build and
//! flag configuration. The compiled script and the dummy blob are discarded
//! with the call; only the header range survives.

use log::debug;

use crate::{
    engine::{EngineSession, PLACEHOLDER_SOURCE},
    error::{Error, Result},
    format::HeaderSchema,
};

impl EngineSession {
    /// Serialize a fresh placeholder compile and return the validated
    /// header range from the resulting blob.
    ///
    /// Deterministic within one session and flag configuration. Any failure
    /// here is fatal: if the engine cannot compile and serialize a trivial
    /// literal, the binding itself is broken and nothing downstream can
    /// work.
    pub fn reference_header(&mut self, schema: &HeaderSchema) -> Result<Vec<u8>> {
        let blob = self.serialize_placeholder()?;
        if blob.len() < schema.min_blob_len() {
            return Err(Error::Setup(format!(
                "dummy cache blob is {} bytes, shorter than the header range end {}",
                blob.len(),
                schema.min_blob_len()
            )));
        }
        debug!(
            "harvested {} reference header bytes from a {}-byte dummy blob",
            schema.len,
            blob.len()
        );
        Ok(blob[schema.range()].to_vec())
    }

    /// Compile the placeholder source and serialize its code cache in full.
    pub(crate) fn serialize_placeholder(&mut self) -> Result<Vec<u8>> {
        self.with_context_scope(|scope| {
            let code = v8::String::new(scope, PLACEHOLDER_SOURCE)
                .ok_or_else(|| Error::Setup("failed to allocate placeholder source".into()))?;
            let script = v8::Script::compile(scope, code, None)
                .ok_or_else(|| Error::Setup("placeholder script did not compile".into()))?;
            let unbound = script.get_unbound_script(scope);
            let cache = unbound.create_code_cache().ok_or_else(|| {
                Error::Setup("engine refused to serialize the placeholder compile".into())
            })?;
            Ok(cache.to_vec())
        })
    }
}
