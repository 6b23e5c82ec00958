//! Process-wide engine bootstrap and the single live engine session.
//!
//! V8 is initialized at most once per process and flags must be set before
//! that initialization, so [`init`] is guarded and later callers with a
//! different flag string keep the first configuration. Everything else in
//! the pipeline runs against one [`EngineSession`].

use std::sync::Once;

use log::warn;
use once_cell::sync::OnceCell;

pub mod loader;
pub mod oracle;

/// Flags the diagnostic setup relies on: eager compilation, no bytecode
/// flushing, and the verbose logging that makes the deserializer print a
/// disassembly listing while consuming a cache. Flags that affect code
/// generation must match the build that produced the target blob; those
/// come from the operator on top of these.
pub const DEFAULT_FLAGS: &str = "--no-lazy --no-flush-bytecode --log-all";

/// Placeholder script compiled by the oracle and re-used as the loader's
/// dummy source. Must be the same string in both places: the source hash
/// spliced into the target header is computed from it.
pub(crate) const PLACEHOLDER_SOURCE: &str = "1111";

static V8_FLAGS: OnceCell<String> = OnceCell::new();
static V8_SHUTDOWN: Once = Once::new();

/// Set engine flags and bring up the platform. First caller wins; a later
/// call with a different flag string is ignored with a warning, because
/// flags cannot be applied once the engine is initialized.
pub fn init(flags: &str) {
    let applied = V8_FLAGS.get_or_init(|| {
        v8::V8::set_flags_from_string(flags);
        let platform = v8::new_default_platform(0, false).make_shared();
        v8::V8::initialize_platform(platform);
        v8::V8::initialize();
        flags.to_owned()
    });
    if applied != flags {
        warn!(
            "engine already initialized with flags {:?}; ignoring {:?}",
            applied, flags
        );
    }
}

/// Tear down the engine and its platform. One-shot and final: the engine
/// cannot be re-initialized in this process, so call only on the way out,
/// after every session has been dropped.
pub fn shutdown() {
    V8_SHUTDOWN.call_once(|| {
        // SAFETY: the caller guarantees no isolate is alive.
        unsafe {
            v8::V8::dispose();
        }
        v8::V8::dispose_platform();
    });
}

/// One live engine instance: a single isolate with a single context.
///
/// Header bytes harvested from a session are only valid for cache loads
/// performed within that same session's lifetime, so the whole pipeline
/// borrows one session mutably end to end. The isolate is dropped exactly
/// once with the session. Not `Send`: every operation must run on the
/// thread that created the session.
pub struct EngineSession {
    isolate: v8::OwnedIsolate,
    context: v8::Global<v8::Context>,
}

impl EngineSession {
    /// Create the session. [`init`] must have run first.
    pub fn new() -> Self {
        let mut isolate = v8::Isolate::new(v8::CreateParams::default());
        let context = {
            let scope = &mut v8::HandleScope::new(&mut isolate);
            let context = v8::Context::new(scope, v8::ContextOptions::default());
            v8::Global::new(scope, context)
        };
        Self { isolate, context }
    }

    /// Enter the session's context for one synchronous operation. All
    /// engine-internal objects allocated by `f` die with the scopes when
    /// this returns.
    pub(crate) fn with_context_scope<T>(
        &mut self,
        f: impl FnOnce(&mut v8::ContextScope<'_, v8::HandleScope<'_>>) -> T,
    ) -> T {
        let scope = &mut v8::HandleScope::new(&mut self.isolate);
        let context = v8::Local::new(scope, &self.context);
        let scope = &mut v8::ContextScope::new(scope, context);
        f(scope)
    }
}

impl Default for EngineSession {
    fn default() -> Self {
        Self::new()
    }
}
