//! Device location sampling.
//!
//! The provider is permission-gated. [`LocationPoller`] asks for permission
//! before the first sample and remembers a grant; a denial only fails the
//! current tick and permission is asked again on the next one. Failures carry
//! no state between ticks (no backoff).
//!
//! Ticks may overlap, so at most one permission prompt is open at a time.
//! Samples that arrive while it is pending wait for its answer instead of
//! prompting again.

use async_trait::async_trait;
use log::{debug, error, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::LocationSample;
use crate::config::LocationSettings;
use crate::error::LocationError;

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Device position source.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask the user/platform for foreground location access.
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError>;

    /// Read the current position.
    async fn current_position(&self) -> Result<LocationSample, LocationError>;
}

/// Produces one fresh [`LocationSample`] per tick.
pub struct LocationPoller {
    granted: AtomicBool,
    denials: AtomicU64,
    // Held for the duration of a permission prompt.
    prompt: Mutex<()>,
    provider: Arc<dyn LocationProvider>,
}

impl LocationPoller {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self {
            granted: AtomicBool::new(false),
            denials: AtomicU64::new(0),
            prompt: Mutex::new(()),
            provider,
        }
    }

    /// Whether a permission grant has been recorded.
    pub fn has_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    /// Take a sample, requesting permission first if it was never granted.
    pub async fn sample(&self) -> Result<LocationSample, LocationError> {
        if !self.has_permission() {
            self.ensure_permission().await?;
        }

        match self.provider.current_position().await {
            Ok(sample) => Ok(sample),
            Err(e) => {
                if e == LocationError::PermissionDenied {
                    // Revoked after the grant; ask again next tick.
                    self.granted.store(false, Ordering::SeqCst);
                }
                warn!("Failed to sample location: {}", e);
                Err(e)
            }
        }
    }

    async fn ensure_permission(&self) -> Result<(), LocationError> {
        let denials_before = self.denials.load(Ordering::SeqCst);
        let _prompt = self.prompt.lock().await;
        if self.has_permission() {
            return Ok(());
        }
        if self.denials.load(Ordering::SeqCst) != denials_before {
            debug!("Location permission denied while this sample was waiting");
            return Err(LocationError::PermissionDenied);
        }

        match self.provider.request_permission().await? {
            PermissionStatus::Granted => {
                self.granted.store(true, Ordering::SeqCst);
                Ok(())
            }
            PermissionStatus::Denied => {
                self.denials.fetch_add(1, Ordering::SeqCst);
                error!("Permission to access location was denied");
                Err(LocationError::PermissionDenied)
            }
        }
    }
}

/// Always-granted provider reporting a fixed position.
#[derive(Debug, Clone)]
pub struct FixedLocationProvider {
    sample: LocationSample,
}

impl FixedLocationProvider {
    pub fn new(sample: LocationSample) -> Self {
        Self { sample }
    }
}

impl From<&LocationSettings> for FixedLocationProvider {
    fn from(settings: &LocationSettings) -> Self {
        Self::new(LocationSample::new(
            settings.latitude,
            settings.longitude,
            settings.altitude,
        ))
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn request_permission(&self) -> Result<PermissionStatus, LocationError> {
        Ok(PermissionStatus::Granted)
    }

    async fn current_position(&self) -> Result<LocationSample, LocationError> {
        Ok(self.sample)
    }
}
