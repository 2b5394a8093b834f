pub mod client_manager;
pub mod scope;

// Re-export the modules here for easy import elsewhere.
pub use client_manager::*;
pub use scope::*;
