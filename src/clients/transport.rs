use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use super::errors::ClientError;

/// The single underlying transport handle shared by every client a manager
/// constructs.
///
/// Cloning shares the same handle; identity is observable through
/// [`SharedTransport::same`]. The manager creates it lazily, at most once per
/// manager, and is the only owner allowed to close it (after all clients).
#[derive(Clone)]
pub struct SharedTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    open: AtomicBool,
}

impl SharedTransport {
    pub(crate) fn open() -> Self {
        Self {
            inner: Arc::new(TransportInner {
                open: AtomicBool::new(true),
            }),
        }
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// Whether two handles refer to the identical underlying transport.
    pub fn same(a: &SharedTransport, b: &SharedTransport) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Closes exactly once; later calls are no-ops.
    pub(crate) async fn close(&self) -> Result<(), ClientError> {
        if !self.inner.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        debug!("shared transport closed");
        Ok(())
    }
}
