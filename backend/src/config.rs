//! Navigator configuration file support.
//!
//! Configuration is read from a TOML file (every field has a default, so an
//! empty file is valid) and then selectively overridden from environment
//! variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::NavigationError;

/// Full navigator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigatorConfig {
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub resolver: ResolverSettings,
    #[serde(default)]
    pub navigation: NavigationSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub route_service: RouteServiceSettings,
    #[serde(default)]
    pub location: LocationSettings,
}

/// Poll cadences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_navigation_interval_ms")]
    pub navigation_interval_ms: u64,
    #[serde(default = "default_store_interval_ms")]
    pub store_interval_ms: u64,
}

/// Next-class resolution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Minutes added to the device time-of-day before comparing with class
    /// start times (stored times are in a different zone than the clock).
    #[serde(default = "default_clock_offset_minutes")]
    pub clock_offset_minutes: i64,
}

/// How completed ticks are applied to the navigation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOrdering {
    /// Results from a tick older than the last applied one are discarded.
    #[default]
    LatestRequest,
    /// Whatever completes last wins, even if it was requested earlier.
    LastCompletion,
}

/// Navigation state machine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationSettings {
    /// Consecutive failed ticks before `Loading` becomes `Unavailable`.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default)]
    pub tick_ordering: TickOrdering,
}

/// Store backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(rename = "type", default = "default_store_type")]
    pub store_type: String,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// Remote route service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteServiceSettings {
    #[serde(default = "default_route_base_url")]
    pub base_url: String,
    #[serde(default = "default_route_timeout_secs")]
    pub timeout_secs: u64,
}

/// Position reported by the fixed location provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSettings {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
}

fn default_navigation_interval_ms() -> u64 {
    3000
}

fn default_store_interval_ms() -> u64 {
    1000
}

fn default_clock_offset_minutes() -> i64 {
    360
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_store_type() -> String {
    "file".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./navigator-store")
}

fn default_route_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_route_timeout_secs() -> u64 {
    20
}

fn default_latitude() -> f64 {
    33.9737
}

fn default_longitude() -> f64 {
    -117.3281
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            navigation_interval_ms: default_navigation_interval_ms(),
            store_interval_ms: default_store_interval_ms(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            clock_offset_minutes: default_clock_offset_minutes(),
        }
    }
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            tick_ordering: TickOrdering::default(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_type: default_store_type(),
            path: default_store_path(),
        }
    }
}

impl Default for RouteServiceSettings {
    fn default() -> Self {
        Self {
            base_url: default_route_base_url(),
            timeout_secs: default_route_timeout_secs(),
        }
    }
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            altitude: None,
        }
    }
}

impl PollingSettings {
    pub fn navigation_interval(&self) -> Duration {
        Duration::from_millis(self.navigation_interval_ms)
    }

    pub fn store_interval(&self) -> Duration {
        Duration::from_millis(self.store_interval_ms)
    }
}

impl RouteServiceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl NavigatorConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, NavigationError> {
        toml::from_str(content).map_err(|e| {
            NavigationError::Configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(NavigatorConfig)` if successful
    /// * `Err(NavigationError)` if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NavigationError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            NavigationError::Configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `navigator.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, NavigationError> {
        let search_paths = [
            PathBuf::from("navigator.toml"),
            PathBuf::from("backend/navigator.toml"),
            PathBuf::from("../navigator.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(NavigationError::Configuration(
            "No navigator.toml found in standard locations".to_string(),
        ))
    }

    /// Apply environment variable overrides.
    ///
    /// # Environment Variables
    /// - `NAVIGATOR_ROUTE_URL`: route service base URL
    /// - `NAVIGATOR_STORE_TYPE`: `local` | `file`
    /// - `NAVIGATOR_STORE_PATH`: directory for the file store
    /// - `NAVIGATOR_TICK_MS`: navigation tick interval in milliseconds
    /// - `NAVIGATOR_STORE_POLL_MS`: store poll interval in milliseconds
    /// - `NAVIGATOR_CLOCK_OFFSET_MINUTES`: resolver clock offset
    ///
    /// # Errors
    /// Returns an error if a numeric variable does not parse.
    pub fn apply_env_overrides(mut self) -> Result<Self, NavigationError> {
        if let Ok(url) = env::var("NAVIGATOR_ROUTE_URL") {
            self.route_service.base_url = url;
        }
        if let Ok(store_type) = env::var("NAVIGATOR_STORE_TYPE") {
            self.store.store_type = store_type;
        }
        if let Ok(path) = env::var("NAVIGATOR_STORE_PATH") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(ms) = parse_env("NAVIGATOR_TICK_MS")? {
            self.polling.navigation_interval_ms = ms;
        }
        if let Some(ms) = parse_env("NAVIGATOR_STORE_POLL_MS")? {
            self.polling.store_interval_ms = ms;
        }
        if let Some(minutes) = parse_env("NAVIGATOR_CLOCK_OFFSET_MINUTES")? {
            self.resolver.clock_offset_minutes = minutes;
        }
        Ok(self)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), NavigationError> {
        if self.polling.navigation_interval_ms == 0 {
            return Err(NavigationError::Configuration(
                "polling.navigation_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.polling.store_interval_ms == 0 {
            return Err(NavigationError::Configuration(
                "polling.store_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.navigation.failure_threshold == 0 {
            return Err(NavigationError::Configuration(
                "navigation.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.route_service.base_url.trim().is_empty() {
            return Err(NavigationError::Configuration(
                "route_service.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, NavigationError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            NavigationError::Configuration(format!("{} must be a valid number, got '{}'", name, raw))
        }),
        Err(_) => Ok(None),
    }
}
