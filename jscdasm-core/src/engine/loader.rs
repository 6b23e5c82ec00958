//! Cache loader: feed a patched blob into the engine's consume-code-cache
//! compile path. The disassembly listing itself is emitted by the engine's
//! own logging while it deserializes the payload; this module only reports
//! whether the cache was consumed.

use log::{debug, info};

use crate::{
    engine::{EngineSession, PLACEHOLDER_SOURCE},
    error::{Error, Result},
    format::{CacheBlob, HeaderSchema},
};

/// Origin label attached to the dummy source; shows up in the engine log
/// next to the disassembly.
const ORIGIN_LABEL: &str = "patched.jsc";

impl EngineSession {
    /// Submit `blob` to the consume-code-cache compile path.
    ///
    /// The dummy source paired with the cached data is the oracle's
    /// placeholder: the source hash stamped into the blob's header was
    /// computed from it, so any other string would fail validation. The
    /// returned script handle is deliberately unused; the observable output
    /// is the disassembly the engine logs while deserializing.
    ///
    /// Rejection is soft: wrong header offsets for this engine build, a
    /// structurally corrupt payload, or codegen flags differing from the
    /// producing build all surface as [`Error::CacheRejected`].
    pub fn load_cache(&mut self, blob: &CacheBlob, schema: &HeaderSchema) -> Result<()> {
        // Abort before any engine call if the blob cannot even hold the
        // header range.
        blob.header(schema)?;
        debug!("submitting {} byte blob for cache consumption", blob.len());

        let consumed = self.with_context_scope(|scope| -> Result<bool> {
            let cached = v8::CachedData::new(blob.as_bytes());
            let code = v8::String::new(scope, PLACEHOLDER_SOURCE)
                .ok_or_else(|| Error::Setup("failed to allocate dummy source".into()))?;
            let name = v8::String::new(scope, ORIGIN_LABEL)
                .ok_or_else(|| Error::Setup("failed to allocate origin label".into()))?;
            let origin = v8::ScriptOrigin::new(
                scope,
                name.into(),
                0,
                0,
                false,
                0,
                None,
                false,
                false,
                false,
                None,
            );

            let mut source =
                v8::script_compiler::Source::new_with_cached_data(code, Some(&origin), cached);
            let script = v8::script_compiler::compile(
                scope,
                &mut source,
                v8::script_compiler::CompileOptions::ConsumeCodeCache,
                v8::script_compiler::NoCacheReason::NoReason,
            );

            // The engine falls back to a plain compile of the dummy source
            // when it declines the cache, so the compile result alone is
            // not enough; the rejected flag on the cached data is the
            // authoritative answer.
            let rejected = source
                .get_cached_data()
                .map_or(true, |data| data.rejected());
            Ok(script.is_some() && !rejected)
        })?;

        if !consumed {
            return Err(Error::CacheRejected);
        }
        info!("cache consumed; disassembly was emitted to the engine log");
        Ok(())
    }
}
