//! smina-run: a building block that wraps the smina molecular docking tool
//!
//! This library checks input and output paths, reads the binding site box,
//! resolves docking options, assembles the smina command line (optionally
//! inside a container) and runs it in a staging sandbox.

pub mod command;
pub mod io;
pub mod properties;
pub mod runner;
pub mod sandbox;
pub mod site;

// Re-export commonly used types and functions
pub use properties::SminaProperties;
pub use runner::{smina_run, SminaError, SminaPaths, SminaRun};
pub use site::BindingSite;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type for operations that can fail
pub type Result<T> = std::result::Result<T, SminaError>;
