pub mod clients;
pub mod core;
pub mod settings;

// re‑export ergonomic entry points
pub use crate::clients::client::{ClientTypeId, ServiceClient};
pub use crate::clients::errors::ClientError;
pub use crate::clients::registry::{ClientBuilder, ClientFactory, ClientRegistry};
pub use crate::clients::transport::SharedTransport;
pub use crate::core::client_manager::{CacheKey, ClientHandle, ClientManager};
pub use crate::core::scope::ManagerScope;
pub use crate::settings::configuration::{AwsRegion, Configuration};
pub use crate::settings::profile::CredentialProfile;
pub use crate::settings::provider::{SettingsChangedListener, SettingsProvider, Subscription};
pub use crate::settings::store::ProfileStore;
