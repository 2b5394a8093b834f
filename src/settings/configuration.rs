use serde::{Deserialize, Serialize};

/// Immutable snapshot of the active credential profile and region.
///
/// Two configurations are equal iff both fields are equal; a settings change
/// never mutates an existing snapshot, it only makes future snapshots differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    pub credential_profile_id: String,
    pub region_id: String,
}

impl Configuration {
    pub fn new(credential_profile_id: impl Into<String>, region_id: impl Into<String>) -> Self {
        Self {
            credential_profile_id: credential_profile_id.into(),
            region_id: region_id.into(),
        }
    }
}

/// An AWS region, e.g. `{ "id": "us-west-2", "display_name": "US West (Oregon)" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsRegion {
    pub id: String,
    pub display_name: String,
}

impl AwsRegion {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}
