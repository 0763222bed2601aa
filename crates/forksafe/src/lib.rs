//! Fork-observer registry for subsystems with background threads.
//!
//! Threads do not survive `fork(2)`: the child process starts with only the
//! forking thread, so any service that owns a background worker must tear
//! itself down and rebuild after a fork. This crate provides the registry half
//! of that contract: subsystems register a hook at startup, and the embedding
//! application arranges for [`run_child_hooks`] to run in the child
//! immediately after forking (directly, or via a `pthread_atfork` shim it
//! owns). There is no portable automatic fork notification in Rust, so the
//! wiring is the embedder's responsibility and platform-specific.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

type Hook = Arc<dyn Fn() + Send + Sync>;

static NEXT_HOOK_ID: AtomicU64 = AtomicU64::new(1);
static HOOKS: Mutex<Vec<(u64, Hook)>> = Mutex::new(Vec::new());

/// Opaque handle identifying a registered hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookId(u64);

/// Register a hook to run in the child process after a fork.
///
/// Hooks run in registration order.
pub fn register<F>(hook: F) -> HookId
where
    F: Fn() + Send + Sync + 'static,
{
    let id = NEXT_HOOK_ID.fetch_add(1, Ordering::Relaxed);
    HOOKS.lock().push((id, Arc::new(hook)));
    debug!(hook_id = id, "Registered fork hook");
    HookId(id)
}

/// Remove a previously registered hook.
///
/// Returns `false` if the hook was already gone.
pub fn unregister(id: HookId) -> bool {
    let mut hooks = HOOKS.lock();
    let before = hooks.len();
    hooks.retain(|(hook_id, _)| *hook_id != id.0);
    before != hooks.len()
}

/// Run all registered hooks in the child process after a fork.
///
/// The hook list is cloned out of the registry lock before any hook runs, so
/// a hook may call [`register`] or [`unregister`] without deadlocking. Hooks
/// registered during this pass run on the next fork, not this one.
pub fn run_child_hooks() {
    let hooks: Vec<Hook> = HOOKS.lock().iter().map(|(_, hook)| hook.clone()).collect();
    debug!(count = hooks.len(), "Running fork hooks in child");
    for hook in hooks {
        hook();
    }
}

/// Number of currently registered hooks.
pub fn hook_count() -> usize {
    HOOKS.lock().len()
}
