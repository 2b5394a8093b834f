use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::debug;

use super::client::{ClientTypeId, ServiceClient};
use super::errors::ClientError;
use super::transport::SharedTransport;
use crate::settings::configuration::Configuration;

/// Constructs one client instance from the shared transport and the
/// configuration snapshot the cache key was computed from.
#[async_trait]
pub trait ClientBuilder: Send + Sync {
    async fn build(
        &self,
        transport: SharedTransport,
        configuration: &Configuration,
    ) -> Result<Arc<dyn ServiceClient>, ClientError>;
}

/// Entry point for one client kind.
///
/// A factory may be registered for a kind that carries no builder (the
/// construction entry point is absent); `builder()` returns `None` and the
/// manager surfaces that descriptively instead of constructing anything.
pub trait ClientFactory: Send + Sync {
    fn builder(&self) -> Option<Arc<dyn ClientBuilder>>;
}

/// Maps client kinds to their factories.
///
/// Cloning is cheap (an Arc bump), so the registry can be handed both to the
/// manager and to whatever code registers kinds at startup.
#[derive(Clone)]
pub struct ClientRegistry {
    factories: Arc<RwLock<HashMap<ClientTypeId, Arc<dyn ClientFactory>>>>,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Associate a factory with a client kind, replacing any previous one.
    pub fn register(&self, type_id: ClientTypeId, factory: Arc<dyn ClientFactory>) {
        debug!("registering client factory for kind '{}'", type_id);
        let mut factories = self.factories.write().expect("factory table poisoned");
        factories.insert(type_id, factory);
    }

    /// Look up the factory for a kind. `None` is a configuration error of the
    /// caller, not retried.
    pub fn resolve(&self, type_id: &ClientTypeId) -> Option<Arc<dyn ClientFactory>> {
        let factories = self.factories.read().expect("factory table poisoned");
        factories.get(type_id).cloned()
    }
}
