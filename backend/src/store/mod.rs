//! Persistent key-value store access.
//!
//! The store is the source of truth for the session identity (`uid`) and the
//! weekly schedule (`Schedule`). It follows the repository pattern so that
//! backends can be swapped:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  SessionPoller (fixed cadence, watch channel)│
//! └───────────────────┬─────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────┐
//! │  ScheduleStoreAccessor (JSON decode)         │
//! └───────────────────┬─────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────┐
//! │  KeyValueStore trait                         │
//! │  - LocalStore (in-memory)                    │
//! │  - FileStore (one JSON file per key)         │
//! └─────────────────────────────────────────────┘
//! ```

pub mod accessor;
pub mod error;
pub mod factory;
pub mod poller;
pub mod repositories;
pub mod repository;

pub use accessor::ScheduleStoreAccessor;
pub use error::{ErrorContext, StoreError, StoreResult};
pub use factory::{StoreFactory, StoreType};
pub use poller::SessionPoller;
pub use repositories::{FileStore, LocalStore};
pub use repository::KeyValueStore;
