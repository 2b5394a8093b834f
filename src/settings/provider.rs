use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;

use super::configuration::{AwsRegion, Configuration};

/// Notified synchronously after a settings mutation is committed, and only
/// when the value actually changed.
pub trait SettingsChangedListener: Send + Sync {
    fn profile_changed(&self) {}
    fn region_changed(&self) {}
}

/// Token handed out by [`SettingsProvider::add_listener`]; pass it back to
/// [`SettingsProvider::remove_listener`] to unsubscribe. Listeners live only
/// as long as their registration, never longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

#[derive(Debug, Clone)]
struct SettingsState {
    profile_id: String,
    region_id: String,
}

/// Holds the active credential profile and region and tells listeners when
/// either changes.
///
/// Cloning shares the same underlying state (an Arc bump), so the provider
/// can be handed to the manager and to settings UI code alike.
#[derive(Clone)]
pub struct SettingsProvider {
    inner: Arc<SettingsInner>,
}

struct SettingsInner {
    state: Mutex<SettingsState>,
    listeners: Mutex<HashMap<u64, Arc<dyn SettingsChangedListener>>>,
    next_subscription: AtomicU64,
}

impl Default for SettingsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsProvider {
    pub const DEFAULT_PROFILE: &'static str = "default";
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    pub fn new() -> Self {
        Self {
            inner: Arc::new(SettingsInner {
                state: Mutex::new(SettingsState {
                    profile_id: Self::DEFAULT_PROFILE.to_owned(),
                    region_id: Self::DEFAULT_REGION.to_owned(),
                }),
                listeners: Mutex::new(HashMap::new()),
                next_subscription: AtomicU64::new(0),
            }),
        }
    }

    /// Synchronous snapshot of the active profile and region.
    pub fn current_configuration(&self) -> Configuration {
        let state = self.inner.state.lock().expect("settings state poisoned");
        Configuration::new(state.profile_id.clone(), state.region_id.clone())
    }

    pub fn set_profile(&self, profile_id: impl Into<String>) {
        let profile_id = profile_id.into();
        let changed = {
            let mut state = self.inner.state.lock().expect("settings state poisoned");
            if state.profile_id == profile_id {
                false
            } else {
                debug!(
                    "active credential profile '{}' -> '{}'",
                    state.profile_id, profile_id
                );
                state.profile_id = profile_id;
                true
            }
        };
        if changed {
            self.notify(|listener| listener.profile_changed());
        }
    }

    pub fn set_region(&self, region: &AwsRegion) {
        let changed = {
            let mut state = self.inner.state.lock().expect("settings state poisoned");
            if state.region_id == region.id {
                false
            } else {
                debug!("active region '{}' -> '{}'", state.region_id, region.id);
                state.region_id = region.id.clone();
                true
            }
        };
        if changed {
            self.notify(|listener| listener.region_changed());
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SettingsChangedListener>) -> Subscription {
        let id = self.inner.next_subscription.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self.inner.listeners.lock().expect("listener table poisoned");
        listeners.insert(id, listener);
        Subscription(id)
    }

    pub fn remove_listener(&self, subscription: Subscription) {
        let mut listeners = self.inner.listeners.lock().expect("listener table poisoned");
        listeners.remove(&subscription.0);
    }

    // Dispatch without holding any lock, so listeners may read the provider
    // or unsubscribe themselves. Order across listeners is unspecified.
    fn notify(&self, action: impl Fn(&dyn SettingsChangedListener)) {
        let listeners: Vec<_> = {
            let listeners = self.inner.listeners.lock().expect("listener table poisoned");
            listeners.values().cloned().collect()
        };
        for listener in listeners {
            action(listener.as_ref());
        }
    }
}
