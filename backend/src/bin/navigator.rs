//! Classroute navigator binary.
//!
//! Runs the navigation engine against a key-value store directory and the
//! remote route service, logging every published screen and navigation state
//! until Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! # Defaults, or ./navigator.toml when present
//! cargo run --bin classroute-navigator
//!
//! # Explicit configuration file
//! cargo run --bin classroute-navigator -- backend/navigator.toml
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)
//! - `NAVIGATOR_ROUTE_URL`, `NAVIGATOR_STORE_TYPE`, `NAVIGATOR_STORE_PATH`,
//!   `NAVIGATOR_TICK_MS`, `NAVIGATOR_STORE_POLL_MS`,
//!   `NAVIGATOR_CLOCK_OFFSET_MINUTES`: configuration overrides

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use classroute::api::NavigationState;
use classroute::config::NavigatorConfig;
use classroute::services::{FixedLocationProvider, HttpRouteService, Orchestrator, SystemClock};
use classroute::store::StoreFactory;

fn load_config() -> anyhow::Result<NavigatorConfig> {
    let config = match env::args().nth(1) {
        Some(path) => NavigatorConfig::from_file(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => NavigatorConfig::from_default_location().unwrap_or_else(|e| {
            warn!("{}; using defaults", e);
            NavigatorConfig::default()
        }),
    };
    let config = config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn describe(state: &NavigationState) -> String {
    match state {
        NavigationState::PreviewingRoute { next_class, route }
        | NavigationState::Navigating { next_class, route } => format!(
            "{} {} at {}: {} min, {} m",
            state.name(),
            next_class.course_number,
            next_class.building_name(),
            route.minutes_needed,
            route.distance_meters
        ),
        NavigationState::Unavailable { reason } => format!("unavailable: {}", reason),
        other => other.name().to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting classroute navigator");

    let config = load_config()?;
    let store = StoreFactory::from_settings(&config.store)?;
    info!(
        "Store initialized ({} at {})",
        config.store.store_type,
        config.store.path.display()
    );

    let routes = HttpRouteService::new(&config.route_service)?;
    info!("Route service: {}", routes.endpoint());

    let handle = Orchestrator::new(
        &config,
        store,
        Arc::new(FixedLocationProvider::from(&config.location)),
        Arc::new(routes),
        Arc::new(SystemClock),
    )
    .start();

    let mut states = handle.subscribe();
    let mut screens = handle.subscribe_screen();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            changed = screens.changed() => {
                if changed.is_err() {
                    break;
                }
                info!("Screen: {:?}", *screens.borrow_and_update());
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let summary = describe(&states.borrow_and_update());
                info!("State: {}", summary);
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
