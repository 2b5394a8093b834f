use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, error, info, warn};
use tokio::sync::OnceCell;

use crate::clients::client::{ClientTypeId, ServiceClient};
use crate::clients::errors::ClientError;
use crate::clients::registry::ClientRegistry;
use crate::clients::transport::SharedTransport;
use crate::core::scope::ManagerScope;
use crate::settings::configuration::Configuration;
use crate::settings::provider::{SettingsChangedListener, SettingsProvider, Subscription};

/// Identifies one cache slot: a client kind built under one configuration
/// snapshot. A settings change produces new keys, never mutated ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    type_id: ClientTypeId,
    configuration: Configuration,
}

impl CacheKey {
    pub fn type_id(&self) -> &ClientTypeId {
        &self.type_id
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }
}

/// A constructed client together with its cache key and a close-exactly-once
/// flag. Owned by the manager; callers only ever see a [`ClientHandle`].
struct CachedClient {
    key: CacheKey,
    client: Arc<dyn ServiceClient>,
    closed: AtomicBool,
}

impl CachedClient {
    fn new(key: CacheKey, client: Arc<dyn ServiceClient>) -> Self {
        Self {
            key,
            client,
            closed: AtomicBool::new(false),
        }
    }

    async fn close(&self) -> Result<(), ClientError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.client.close().await
    }
}

/// A shared reference to a cached client.
///
/// Valid until the next configuration change affecting its kind or until
/// scope teardown; the manager retains ownership and closes the underlying
/// client at shutdown even if handles are still around.
#[derive(Clone)]
pub struct ClientHandle {
    entry: Arc<CachedClient>,
}

impl ClientHandle {
    pub fn client(&self) -> &dyn ServiceClient {
        self.entry.client.as_ref()
    }

    pub fn service_name(&self) -> &str {
        self.entry.client.service_name()
    }

    pub fn type_id(&self) -> &ClientTypeId {
        self.entry.key.type_id()
    }

    /// The configuration snapshot this client was built under.
    pub fn configuration(&self) -> &Configuration {
        self.entry.key.configuration()
    }

    pub fn is_closed(&self) -> bool {
        self.entry.closed.load(Ordering::Acquire)
    }

    /// Whether two handles refer to the identical cached instance.
    pub fn same_client(a: &ClientHandle, b: &ClientHandle) -> bool {
        Arc::ptr_eq(&a.entry, &b.entry)
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("type_id", self.type_id())
            .field("configuration", self.configuration())
            .field("closed", &self.is_closed())
            .finish()
    }
}

type ConstructionCell = Arc<OnceCell<Arc<CachedClient>>>;

struct ManagerState {
    closed: bool,
    /// One single-flight cell per cache key. Entries built under a previous
    /// configuration simply stop being looked up; they are not pruned, so a
    /// configuration that flips back finds its old entry again.
    cells: HashMap<CacheKey, ConstructionCell>,
    /// Every client ever built by this manager, in build order. Shutdown
    /// closes the roster, which covers entries orphaned by settings changes
    /// or explicit invalidation.
    roster: Vec<Arc<CachedClient>>,
}

struct ManagerInner {
    settings: SettingsProvider,
    registry: ClientRegistry,
    transport: OnceCell<SharedTransport>,
    state: Mutex<ManagerState>,
    settings_subscription: Mutex<Option<Subscription>>,
}

/// Produces, caches, and releases remote-service clients keyed by
/// (client kind, configuration snapshot).
///
/// The internal state lives behind an Arc, so the manager can be cloned
/// cheaply and shared across tasks; all clones observe the same cache. One
/// manager exists per [`ManagerScope`] and is handed to callers explicitly,
/// never looked up ambiently.
#[derive(Clone)]
pub struct ClientManager {
    inner: Arc<ManagerInner>,
}

// Logs when cached entries go stale. Holds only a Weak so the settings
// provider never keeps a dropped manager alive; invalidation itself is lazy
// (lookups key on the current configuration).
struct StaleWatcher {
    manager: Weak<ManagerInner>,
}

impl StaleWatcher {
    fn log_stale(&self, what: &str) {
        if let Some(inner) = self.manager.upgrade() {
            let cached = inner.state.lock().expect("manager state poisoned").cells.len();
            if cached > 0 {
                debug!(
                    "{} changed; {} cached client entries are now keyed to a previous configuration",
                    what, cached
                );
            }
        }
    }
}

impl SettingsChangedListener for StaleWatcher {
    fn profile_changed(&self) {
        self.log_stale("credential profile");
    }

    fn region_changed(&self) {
        self.log_stale("region");
    }
}

impl ClientManager {
    pub fn new(settings: SettingsProvider, registry: ClientRegistry) -> Self {
        let inner = Arc::new(ManagerInner {
            settings: settings.clone(),
            registry,
            transport: OnceCell::new(),
            state: Mutex::new(ManagerState {
                closed: false,
                cells: HashMap::new(),
                roster: Vec::new(),
            }),
            settings_subscription: Mutex::new(None),
        });
        let subscription = settings.add_listener(Arc::new(StaleWatcher {
            manager: Arc::downgrade(&inner),
        }));
        *inner
            .settings_subscription
            .lock()
            .expect("subscription slot poisoned") = Some(subscription);
        Self { inner }
    }

    /// Get the cached client for `type_id` under the current configuration,
    /// constructing it on first use.
    ///
    /// Concurrent calls for the same (kind, configuration) collapse into one
    /// construction: the losers wait on the winner's cell and receive the
    /// same instance. Construction may be slow (it can open real
    /// connections); there is no cancellation primitive.
    pub async fn get_client(&self, type_id: &ClientTypeId) -> Result<ClientHandle, ClientError> {
        let configuration = self.inner.settings.current_configuration();
        let key = CacheKey {
            type_id: type_id.clone(),
            configuration: configuration.clone(),
        };

        let cell: ConstructionCell = {
            let mut state = self.inner.state.lock().expect("manager state poisoned");
            if state.closed {
                return Err(ClientError::ManagerClosed);
            }
            state
                .cells
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let entry = cell
            .get_or_try_init(|| self.construct(type_id, &key, &configuration))
            .await?
            .clone();

        // Shutdown may have started while this call was in flight; the entry
        // is already on the roster, so shutdown closes it. Fail fast rather
        // than handing out a client that is being torn down.
        if self.inner.state.lock().expect("manager state poisoned").closed {
            return Err(ClientError::ManagerClosed);
        }
        Ok(ClientHandle { entry })
    }

    // Single-flight construction body for one cache key.
    async fn construct(
        &self,
        type_id: &ClientTypeId,
        key: &CacheKey,
        configuration: &Configuration,
    ) -> Result<Arc<CachedClient>, ClientError> {
        if self.inner.state.lock().expect("manager state poisoned").closed {
            return Err(ClientError::ManagerClosed);
        }

        let factory = self
            .inner
            .registry
            .resolve(type_id)
            .ok_or_else(|| ClientError::UnsupportedClientKind(type_id.clone()))?;
        let builder = factory.builder().ok_or_else(|| ClientError::BuilderMissing {
            type_id: type_id.clone(),
            entry_point: "builder()",
        })?;

        let transport = self.shared_transport().await;
        debug!(
            "building '{}' client for profile '{}' in region '{}'",
            type_id, configuration.credential_profile_id, configuration.region_id
        );
        let client = builder.build(transport, configuration).await?;
        let entry = Arc::new(CachedClient::new(key.clone(), client));

        let raced_shutdown = {
            let mut state = self.inner.state.lock().expect("manager state poisoned");
            if state.closed {
                true
            } else {
                state.roster.push(entry.clone());
                false
            }
        };
        if raced_shutdown {
            // Built after shutdown began; release it instead of leaking.
            if let Err(e) = entry.close().await {
                warn!("failed to close client built during shutdown: {}", e);
            }
            // The transport may have been created after shutdown already
            // checked it and found nothing to close; close is idempotent,
            // so cover that window here.
            if let Some(transport) = self.inner.transport.get() {
                if let Err(e) = transport.close().await {
                    warn!("failed to close shared transport after shutdown: {}", e);
                }
            }
            return Err(ClientError::ManagerClosed);
        }
        Ok(entry)
    }

    // Create-once, guarded independently of any cache key's cell.
    async fn shared_transport(&self) -> SharedTransport {
        self.inner
            .transport
            .get_or_init(|| async {
                info!("opening shared transport");
                SharedTransport::open()
            })
            .await
            .clone()
    }

    /// Drop cached entries for one kind so the next `get_client` rebuilds.
    /// The transport stays open; orphaned clients are closed at shutdown.
    pub fn invalidate(&self, type_id: &ClientTypeId) {
        let mut state = self.inner.state.lock().expect("manager state poisoned");
        let before = state.cells.len();
        state.cells.retain(|key, _| key.type_id() != type_id);
        debug!(
            "invalidated {} cached entries for kind '{}'",
            before - state.cells.len(),
            type_id
        );
    }

    /// Drop every cached entry. The transport stays open.
    pub fn invalidate_all(&self) {
        let mut state = self.inner.state.lock().expect("manager state poisoned");
        let dropped = state.cells.len();
        state.cells.clear();
        debug!("invalidated all {} cached entries", dropped);
    }

    /// Close every client this manager ever built, then the shared transport.
    ///
    /// Best-effort: a failing close never prevents the remaining releases;
    /// failures are aggregated into [`ClientError::Shutdown`]. Idempotent,
    /// and later `get_client` calls fail with [`ClientError::ManagerClosed`].
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        let entries = {
            let mut state = self.inner.state.lock().expect("manager state poisoned");
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.cells.clear();
            std::mem::take(&mut state.roster)
        };

        if let Some(subscription) = self
            .inner
            .settings_subscription
            .lock()
            .expect("subscription slot poisoned")
            .take()
        {
            self.inner.settings.remove_listener(subscription);
        }

        info!("shutting down client manager; closing {} client(s)", entries.len());
        let mut failures = Vec::new();
        for entry in entries {
            if let Err(e) = entry.close().await {
                error!("failed to close '{}' client: {}", entry.key.type_id(), e);
                failures.push(format!("{}: {}", entry.key.type_id(), e));
            }
        }

        // The transport goes last, after every client using it is closed.
        if let Some(transport) = self.inner.transport.get() {
            if let Err(e) = transport.close().await {
                error!("failed to close shared transport: {}", e);
                failures.push(format!("transport: {}", e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Shutdown(failures))
        }
    }

    /// Bind this manager's shutdown to the scope's teardown notification.
    pub fn attach_to_scope(&self, scope: &ManagerScope) {
        let manager = self.clone();
        scope.on_teardown(move || async move {
            if let Err(e) = manager.shutdown().await {
                error!("client manager shutdown reported failures: {}", e);
            }
        });
    }
}
