use std::fmt::{self, Display};

use async_trait::async_trait;

use super::errors::ClientError;

/// Opaque identifier naming a remote-service client flavor ("s3", "lambda", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientTypeId(String);

impl ClientTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientTypeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl Display for ClientTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A trait representing a constructed remote-service client.
///
/// Handles to one client are shared between the cache and any number of
/// callers, so `close` takes `&self`; implementations track their open/closed
/// state internally (an atomic flag is enough) and must tolerate being closed
/// while a caller still holds a handle.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The service this client talks to, e.g. "s3".
    fn service_name(&self) -> &str;

    /// Release the client's resources.
    async fn close(&self) -> Result<(), ClientError>;
}
