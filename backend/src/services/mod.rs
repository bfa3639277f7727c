//! Service layer for the navigation engine.
//!
//! Leaf-first: the resolver and the location/route clients are independent;
//! the state machine consumes their results; the orchestrator wires them to
//! the store snapshot on a fixed cadence.

pub mod location;
pub mod navigation;
pub mod next_class;
pub mod orchestrator;
pub mod route;

pub use location::{FixedLocationProvider, LocationPoller, LocationProvider, PermissionStatus};
pub use navigation::{Applied, NavigationAction, NavigationMachine, TickOutcome};
pub use next_class::{parse_start_time, resolve_next_class, ResolverPolicy};
pub use orchestrator::{
    Clock, FixedClock, NavigatorHandle, Orchestrator, SystemClock, TickOrdering,
};
#[cfg(feature = "http-route")]
pub use route::HttpRouteService;
pub use route::{normalize_route, RouteCoordinator, RouteQuery, RouteService};
