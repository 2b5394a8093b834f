use std::fmt::{self, Display};

use crate::clients::client::ClientTypeId;

/// A central error enum for client construction and lifecycle errors.
#[derive(Debug)]
pub enum ClientError {
    /// No factory is registered for the requested client kind.
    UnsupportedClientKind(ClientTypeId),
    /// The factory exists but exposes no builder entry point.
    BuilderMissing {
        type_id: ClientTypeId,
        entry_point: &'static str,
    },
    /// The manager has been shut down; no further clients are handed out.
    ManagerClosed,
    /// A factory failed while constructing a client. Not cached; the next
    /// request retries construction.
    Build(String),
    /// One or more resources could not be released during shutdown. Release
    /// is best-effort, so every failure is collected rather than aborting.
    Shutdown(Vec<String>),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::UnsupportedClientKind(type_id) => {
                write!(f, "no client factory registered for kind '{}'", type_id)
            }
            ClientError::BuilderMissing {
                type_id,
                entry_point,
            } => write!(
                f,
                "client kind '{}' has no {} entry point",
                type_id, entry_point
            ),
            ClientError::ManagerClosed => write!(f, "client manager is shut down"),
            ClientError::Build(msg) => write!(f, "client construction failed: {}", msg),
            ClientError::Shutdown(failures) => write!(
                f,
                "shutdown finished with {} release failure(s): {}",
                failures.len(),
                failures.join("; ")
            ),
        }
    }
}

impl std::error::Error for ClientError {}
