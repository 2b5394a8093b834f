pub mod client;
pub mod errors;
pub mod registry;
pub mod transport;

// Re-export the modules here for easy import elsewhere.
pub use client::*;
pub use errors::*;
pub use registry::*;
pub use transport::*;
