//! Deterministic **in-process stand-ins** for anything that implements
//! `awskit_core::ServiceClient`.
//!
//! *  **From the test's perspective**
//!    * Register the returned `RecordingFactory` in a `ClientRegistry` and
//!      let the manager build clients from it.
//!    * Inspect everything through the returned `RecordingBuilder`:
//!      construction count, the transport injected into each build, the
//!      configuration snapshot each client saw, and each client's `closed`
//!      flag.
//!
//! *  **Why this exists**: It lets integration tests exercise the *real*
//!    caching machinery (single-flight cells, roster, teardown) without
//!    talking to any actual AWS endpoint.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use awskit_core::{
    ClientBuilder, ClientError, ClientFactory, Configuration, ServiceClient, SharedTransport,
};
use tokio::sync::Barrier;

/// A fake service client whose `closed` flag the test keeps a clone of.
pub struct TestClient {
    name: &'static str,
    closed: Arc<AtomicBool>,
    fail_close: bool,
}

#[async_trait]
impl ServiceClient for TestClient {
    fn service_name(&self) -> &str {
        self.name
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(ClientError::Build("simulated close failure".into()));
        }
        Ok(())
    }
}

/// Builder that records every construction for later assertions.
pub struct RecordingBuilder {
    name: &'static str,
    constructions: AtomicUsize,
    closed_flags: Mutex<Vec<Arc<AtomicBool>>>,
    transports: Mutex<Vec<SharedTransport>>,
    configurations: Mutex<Vec<Configuration>>,
    build_delay: Option<Duration>,
    gate: Option<Arc<Barrier>>,
    fail_close: bool,
}

impl RecordingBuilder {
    fn plain(name: &'static str) -> Self {
        Self {
            name,
            constructions: AtomicUsize::new(0),
            closed_flags: Mutex::new(Vec::new()),
            transports: Mutex::new(Vec::new()),
            configurations: Mutex::new(Vec::new()),
            build_delay: None,
            gate: None,
            fail_close: false,
        }
    }

    /// How many clients this builder has constructed so far.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    /// The transport injected into each build, in build order.
    pub fn transports(&self) -> Vec<SharedTransport> {
        self.transports.lock().unwrap().clone()
    }

    /// The configuration snapshot each build saw, in build order.
    pub fn configurations(&self) -> Vec<Configuration> {
        self.configurations.lock().unwrap().clone()
    }

    /// `closed` flag of every client ever built, in build order.
    pub fn closed_flags(&self) -> Vec<Arc<AtomicBool>> {
        self.closed_flags.lock().unwrap().clone()
    }

    pub fn all_closed(&self) -> bool {
        let flags = self.closed_flags.lock().unwrap();
        !flags.is_empty() && flags.iter().all(|f| f.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl ClientBuilder for RecordingBuilder {
    async fn build(
        &self,
        transport: SharedTransport,
        configuration: &Configuration,
    ) -> Result<Arc<dyn ServiceClient>, ClientError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if let Some(delay) = self.build_delay {
            tokio::time::sleep(delay).await;
        }
        self.constructions.fetch_add(1, Ordering::SeqCst);
        self.transports.lock().unwrap().push(transport);
        self.configurations.lock().unwrap().push(configuration.clone());

        let closed = Arc::new(AtomicBool::new(false));
        self.closed_flags.lock().unwrap().push(closed.clone());
        Ok(Arc::new(TestClient {
            name: self.name,
            closed,
            fail_close: self.fail_close,
        }))
    }
}

/// Factory wrapping a [`RecordingBuilder`].
pub struct RecordingFactory {
    builder: Arc<RecordingBuilder>,
    resolve_delay: Option<Duration>,
}

impl ClientFactory for RecordingFactory {
    fn builder(&self) -> Option<Arc<dyn ClientBuilder>> {
        if let Some(delay) = self.resolve_delay {
            // Deliberately blocks the worker thread: resolution happens
            // before the manager touches the shared transport, so this
            // holds a construction right inside that window.
            std::thread::sleep(delay);
        }
        Some(self.builder.clone())
    }
}

impl RecordingFactory {
    /// Create a factory plus the builder probe the test keeps for assertions.
    pub fn new(name: &'static str) -> (Arc<Self>, Arc<RecordingBuilder>) {
        Self::wrap(RecordingBuilder::plain(name))
    }

    /// Every build sleeps first, widening the race window for single-flight
    /// assertions.
    pub fn slow(name: &'static str, delay: Duration) -> (Arc<Self>, Arc<RecordingBuilder>) {
        let mut builder = RecordingBuilder::plain(name);
        builder.build_delay = Some(delay);
        Self::wrap(builder)
    }

    /// Every build waits on the barrier before proceeding; two gated builds
    /// sharing one barrier can only finish if they run concurrently.
    pub fn gated(name: &'static str, gate: Arc<Barrier>) -> (Arc<Self>, Arc<RecordingBuilder>) {
        let mut builder = RecordingBuilder::plain(name);
        builder.gate = Some(gate);
        Self::wrap(builder)
    }

    /// Built clients fail their `close()` call (after flipping the flag).
    pub fn failing_close(name: &'static str) -> (Arc<Self>, Arc<RecordingBuilder>) {
        let mut builder = RecordingBuilder::plain(name);
        builder.fail_close = true;
        Self::wrap(builder)
    }

    /// `builder()` itself blocks before returning, stalling a construction
    /// after the manager's closed check but before it touches the transport.
    pub fn slow_resolve(name: &'static str, delay: Duration) -> (Arc<Self>, Arc<RecordingBuilder>) {
        let builder = Arc::new(RecordingBuilder::plain(name));
        (
            Arc::new(Self {
                builder: builder.clone(),
                resolve_delay: Some(delay),
            }),
            builder,
        )
    }

    fn wrap(builder: RecordingBuilder) -> (Arc<Self>, Arc<RecordingBuilder>) {
        let builder = Arc::new(builder);
        (
            Arc::new(Self {
                builder: builder.clone(),
                resolve_delay: None,
            }),
            builder,
        )
    }
}

/// Factory for a client kind whose builder entry point is absent.
pub struct BuilderlessFactory;

impl ClientFactory for BuilderlessFactory {
    fn builder(&self) -> Option<Arc<dyn ClientBuilder>> {
        None
    }
}
