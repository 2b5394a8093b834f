pub mod configuration;
pub mod profile;
pub mod provider;
pub mod store;

// Re-export the modules here for easy import elsewhere.
pub use configuration::*;
pub use profile::*;
pub use provider::*;
pub use store::*;
