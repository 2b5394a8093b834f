use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{info, warn};

type TeardownCallback = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// The lifetime boundary a [`ClientManager`](crate::ClientManager) is bound
/// to (one per project in the IDE case).
///
/// Teardown fires each registered callback exactly once; the scope is
/// unusable afterwards, and a second `teardown` is a no-op.
#[derive(Clone)]
pub struct ManagerScope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    name: String,
    torn_down: AtomicBool,
    callbacks: Mutex<Vec<TeardownCallback>>,
}

impl ManagerScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                name: name.into(),
                torn_down: AtomicBool::new(false),
                callbacks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::Acquire)
    }

    /// Register a callback to run when the scope is torn down. Registration
    /// on an already-torn-down scope is rejected.
    pub fn on_teardown<F, Fut>(&self, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // The flag is read while holding the callbacks lock: teardown flips
        // it before draining, so either we see it set and reject, or our
        // push lands before the drain and the callback runs.
        let mut callbacks = self.inner.callbacks.lock().expect("scope callbacks poisoned");
        if self.is_torn_down() {
            warn!(
                "scope '{}' is already torn down; ignoring teardown registration",
                self.inner.name
            );
            return;
        }
        callbacks.push(Box::new(move || Box::pin(callback())));
    }

    /// Fire every registered callback, exactly once per scope.
    pub async fn teardown(&self) {
        if self.inner.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let callbacks = {
            let mut callbacks = self.inner.callbacks.lock().expect("scope callbacks poisoned");
            std::mem::take(&mut *callbacks)
        };
        info!(
            "tearing down scope '{}' ({} callback(s))",
            self.inner.name,
            callbacks.len()
        );
        for callback in callbacks {
            callback().await;
        }
    }
}
