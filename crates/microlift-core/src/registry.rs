//! Runtime protocol model.
//!
//! An explicitly-owned Rust model of the page-global registries and the
//! deferred lifecycle handshake the injected shims realize in the page, so
//! the protocol is unit-testable without a browser. Semantics mirror the
//! shims exactly: one-shot fulfilment per lifecycle name, calls issued
//! before fulfilment queue in order and wait indefinitely (no timeout, no
//! cancellation), registration is last-write-wins per sub-application name,
//! and there is no unregister. Re-mount after unmount is undefined behavior,
//! matching the one-shot assumption in the shims.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Props passed to a lifecycle call, as the host supplies them.
pub type Props = serde_json::Value;

/// An installed lifecycle implementation.
pub type LifecycleFn = Arc<dyn Fn(Props) + Send + Sync>;

/// The four lifecycle hooks of the host contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleName {
    Bootstrap,
    Mount,
    Unmount,
    Update,
}

impl LifecycleName {
    pub const ALL: [Self; 4] = [Self::Bootstrap, Self::Mount, Self::Unmount, Self::Update];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Mount => "mount",
            Self::Unmount => "unmount",
            Self::Update => "update",
        }
    }

    /// The sandbox property the export shim assigns to resolve this hook's
    /// deferred (`vitebootstrap`, `vitemount`, ...).
    #[must_use]
    pub fn sandbox_property(self) -> String {
        format!("vite{}", self.as_str())
    }
}

impl std::fmt::Display for LifecycleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
struct HookState {
    handler: Option<LifecycleFn>,
    pending: VecDeque<Props>,
}

/// A single-resolution deferred for one lifecycle name.
///
/// "Call now, execute later": `call` is always immediately invocable, but
/// its effect waits for `fulfil`. Calls issued before fulfilment queue in
/// order, never time out and are never dropped. Fulfilment releases the
/// queue exactly once; later fulfilment attempts are ignored.
#[derive(Default)]
pub struct DeferredHook {
    state: Mutex<HookState>,
}

impl DeferredHook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the hook with `props`, or queue the call when no
    /// implementation is installed yet.
    pub fn call(&self, props: Props) {
        let handler = {
            let mut state = self.state.lock().unwrap();
            match &state.handler {
                Some(handler) => Arc::clone(handler),
                None => {
                    state.pending.push_back(props);
                    return;
                }
            }
        };
        handler(props);
    }

    /// Install the real implementation, draining queued calls in order.
    /// Ignored when an implementation is already installed.
    pub fn fulfil(&self, handler: LifecycleFn) {
        let drained = {
            let mut state = self.state.lock().unwrap();
            if state.handler.is_some() {
                return;
            }
            state.handler = Some(Arc::clone(&handler));
            std::mem::take(&mut state.pending)
        };
        for props in drained {
            handler(props);
        }
    }

    /// Whether the real implementation has been installed.
    #[must_use]
    pub fn is_fulfilled(&self) -> bool {
        self.state.lock().unwrap().handler.is_some()
    }

    /// Calls currently waiting for fulfilment.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }
}

/// One sub-application's four deferred lifecycle hooks.
#[derive(Default)]
pub struct LifecycleHandles {
    bootstrap: DeferredHook,
    mount: DeferredHook,
    unmount: DeferredHook,
    update: DeferredHook,
}

impl LifecycleHandles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hook(&self, name: LifecycleName) -> &DeferredHook {
        match name {
            LifecycleName::Bootstrap => &self.bootstrap,
            LifecycleName::Mount => &self.mount,
            LifecycleName::Unmount => &self.unmount,
            LifecycleName::Update => &self.update,
        }
    }
}

/// The page-global sandbox registry, keyed by sub-application name.
///
/// Created on first write, cleared only when the page (the registry owner)
/// goes away. Writes are last-write-wins; each name is assumed to
/// correspond to one loaded sandbox instance by host contract.
#[derive(Default)]
pub struct SandboxRegistry {
    entries: Mutex<HashMap<String, Arc<LifecycleHandles>>>,
}

impl SandboxRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sub-application, returning its fresh handles. A second
    /// registration under the same name replaces the first silently.
    pub fn register(&self, name: impl Into<String>) -> Arc<LifecycleHandles> {
        let handles = Arc::new(LifecycleHandles::new());
        self.entries
            .lock()
            .unwrap()
            .insert(name.into(), Arc::clone(&handles));
        handles
    }

    /// Look up a sub-application's handles.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<LifecycleHandles>> {
        self.entries.lock().unwrap().get(name).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
