//! Store implementations module.
//!
//! This module contains the implementations of the `KeyValueStore` trait:
//! - `local`: In-memory implementation for unit testing and local development
//! - `file`: Directory-backed implementation, one JSON file per key
pub mod file;
pub mod local;

pub use file::FileStore;
pub use local::LocalStore;
