//! # Classroute Navigator
//!
//! Client-side schedule and navigation state engine.
//!
//! Given a stored weekly timetable, this crate works out which class a
//! student should walk to next, samples the device position on a fixed
//! cadence, asks a remote route service for a walking path, and publishes a
//! single observable navigation state for a presentation layer to render.
//!
//! ## Features
//!
//! - **Next-class resolution**: pure function over a weekly schedule and the
//!   current instant
//! - **Session polling**: identity and schedule re-read from a key-value store
//! - **Route requests**: normalized results from the remote shortest-path
//!   service, with stale-but-valid retention on failure
//! - **Navigation state**: `Loading`, `NoClassesToday`, `PreviewingRoute`,
//!   `Navigating` and `Unavailable`, with start/cancel/toggle controls
//! - **Tick ordering**: per-tick generations so a late response from an older
//!   tick cannot overwrite a newer one
//!
//! ## Architecture
//!
//! - [`api`]: data model shared by every layer
//! - [`store`]: key-value store access, repository pattern and session poller
//! - [`services`]: resolver, location, route, state machine and orchestrator
//! - [`config`]: TOML configuration with environment overrides
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use classroute::config::NavigatorConfig;
//! use classroute::services::{FixedLocationProvider, HttpRouteService, Orchestrator, SystemClock};
//! use classroute::store::StoreFactory;
//!
//! let config = NavigatorConfig::default();
//! let orchestrator = Orchestrator::new(
//!     &config,
//!     StoreFactory::from_settings(&config.store)?,
//!     Arc::new(FixedLocationProvider::from(&config.location)),
//!     Arc::new(HttpRouteService::new(&config.route_service)?),
//!     Arc::new(SystemClock),
//! );
//! let handle = orchestrator.start();
//! let mut states = handle.subscribe();
//! ```

// StoreError carries an ErrorContext for debugging.
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod store;

pub use api::{AppScreen, NavigationState, NextClass, RouteResult, WeeklySchedule};
pub use config::NavigatorConfig;
pub use error::{NavigationError, NavigationResult};
