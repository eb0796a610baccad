//! Shared foundation for the ReachCheck workspace.
//!
//! Holds the pieces both the engine and any future front-end need: the error
//! taxonomy, process configuration, and the core identity types (provider
//! tags, comparison fields, identity hints, search candidates).

pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
