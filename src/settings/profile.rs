use serde::{Deserialize, Serialize};

/// A named credential preset.
///
/// The enum is `#[serde(tag = "kind")]` so JSON looks like:
/// `{ "name":"dev", "kind":"Static", "access_key_id":"AKIA...", "secret_access_key":"..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CredentialProfile {
    Static {
        name: String,
        access_key_id: String,
        secret_access_key: String,
    },
    Shared {
        name: String,
        source_profile: String,
    },
}

impl CredentialProfile {
    /// Returns the unique, human-readable identifier.
    pub fn name(&self) -> &str {
        match self {
            CredentialProfile::Static { name, .. } => name,
            CredentialProfile::Shared { name, .. } => name,
        }
    }
}
