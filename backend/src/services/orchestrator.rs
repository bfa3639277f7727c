//! Poll-driven orchestration of the navigation engine.
//!
//! Every navigation tick runs, in order: location sample, next-class
//! resolution against the latest session snapshot, route request, state
//! update. Ticks are spawned on a fixed cadence and are not cancelled when the
//! next one fires, so they may overlap. Each tick carries a generation number
//! taken when it is spawned; see [`TickOrdering`] for how late completions
//! are treated.
//!
//! The session snapshot comes from a [`SessionPoller`] on its own cadence.
//! Resolve and route steps only run while the session is on the
//! [`AppScreen::Landing`] screen.
//!
//! Presentation reads state through `watch` receivers handed out by
//! [`NavigatorHandle`]; only the engine writes.

use chrono::{DateTime, FixedOffset, Local};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use super::location::{LocationPoller, LocationProvider};
use super::navigation::{Applied, NavigationAction, NavigationMachine, TickOutcome};
use super::next_class::{resolve_next_class, ResolverPolicy};
use super::route::{RouteCoordinator, RouteService};
use crate::api::{AppScreen, NavigationState, NextClass, SessionSnapshot};
use crate::config::NavigatorConfig;
use crate::error::NavigationResult;
use crate::store::{KeyValueStore, ScheduleStoreAccessor, SessionPoller};

pub use crate::config::TickOrdering;

/// Wall-clock source for next-class resolution.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Device local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

/// State shared between the tick loop, spawned ticks and the handle.
struct Engine {
    policy: ResolverPolicy,
    location: LocationPoller,
    routes: RouteCoordinator,
    clock: Arc<dyn Clock>,
    machine: Mutex<NavigationMachine>,
    generation: AtomicU64,
    session: watch::Receiver<SessionSnapshot>,
    state_tx: watch::Sender<NavigationState>,
    screen_tx: watch::Sender<AppScreen>,
    shutdown: watch::Receiver<bool>,
}

impl Engine {
    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish_screen(&self, screen: AppScreen) {
        self.screen_tx.send_if_modified(|current| {
            if *current == screen {
                false
            } else {
                info!("Screen: {:?}", screen);
                *current = screen;
                true
            }
        });
    }

    async fn run_tick(&self, generation: u64) -> Option<Applied> {
        if self.is_shut_down() {
            return None;
        }

        let screen = self.session.borrow().screen();
        self.publish_screen(screen);
        if screen != AppScreen::Landing {
            debug!("Tick {} skipped on {:?} screen", generation, screen);
            return None;
        }

        let outcome = self.evaluate().await;
        if self.is_shut_down() {
            debug!("Tick {} finished after shutdown; dropped", generation);
            return None;
        }

        let mut machine = self.machine.lock();
        let applied = machine.apply(generation, outcome);
        if applied == Applied::Changed {
            self.state_tx.send_replace(machine.state().clone());
        }
        Some(applied)
    }

    async fn evaluate(&self) -> TickOutcome {
        let sample = match self.location.sample().await {
            Ok(sample) => sample,
            Err(e) => return TickOutcome::failed(e.to_string()),
        };

        let snapshot = self.session.borrow().clone();
        let now = self.clock.now();
        let next = match resolve_next_class(snapshot.schedule.as_ref(), &now, &self.policy) {
            Ok(Some(next)) => next,
            Ok(None) => return TickOutcome::Unresolved,
            Err(e) => {
                error!("Schedule data error: {}", e);
                return TickOutcome::failed(e.to_string());
            }
        };

        let NextClass::Class(entry) = &next else {
            return TickOutcome::NoClasses;
        };

        match self
            .routes
            .request_route(&next, &sample, snapshot.uid.as_deref())
            .await
        {
            Ok(Some(route)) => TickOutcome::Route {
                next_class: entry.clone(),
                route,
            },
            Ok(None) => TickOutcome::NoClasses,
            Err(e) => TickOutcome::Failed {
                reason: e.to_string(),
                next_class: Some(entry.clone()),
            },
        }
    }

    fn act(&self, action: NavigationAction) -> NavigationResult<()> {
        let mut machine = self.machine.lock();
        machine.act(action)?;
        self.state_tx.send_replace(machine.state().clone());
        Ok(())
    }
}

/// Wires the store, location, resolver, route and state machine together.
pub struct Orchestrator {
    engine: Arc<Engine>,
    poller: SessionPoller,
    session_tx: watch::Sender<SessionSnapshot>,
    shutdown_tx: watch::Sender<bool>,
    tick_interval: Duration,
}

impl Orchestrator {
    pub fn new(
        config: &NavigatorConfig,
        store: Arc<dyn KeyValueStore>,
        location: Arc<dyn LocationProvider>,
        routes: Arc<dyn RouteService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (session_tx, session_rx) = watch::channel(SessionSnapshot::default());
        let (state_tx, _) = watch::channel(NavigationState::Loading);
        let (screen_tx, _) = watch::channel(AppScreen::SignIn);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let engine = Engine {
            policy: ResolverPolicy::from(&config.resolver),
            location: LocationPoller::new(location),
            routes: RouteCoordinator::new(routes),
            clock,
            machine: Mutex::new(NavigationMachine::new(
                config.navigation.failure_threshold,
                config.navigation.tick_ordering,
            )),
            generation: AtomicU64::new(0),
            session: session_rx,
            state_tx,
            screen_tx,
            shutdown: shutdown_rx,
        };

        Self {
            engine: Arc::new(engine),
            poller: SessionPoller::new(
                ScheduleStoreAccessor::new(store),
                config.polling.store_interval(),
            ),
            session_tx,
            shutdown_tx,
            tick_interval: config.polling.navigation_interval(),
        }
    }

    /// Read the store once and publish the snapshot if it changed.
    pub async fn refresh_session(&self) -> bool {
        let changed = self.poller.poll_once(&self.session_tx).await;
        self.engine
            .publish_screen(self.engine.session.borrow().screen());
        changed
    }

    /// Run one tick to completion on the current task.
    ///
    /// Returns `None` when the tick was skipped (not on the landing screen,
    /// or shut down).
    pub async fn tick(&self) -> Option<Applied> {
        let generation = self.engine.next_generation();
        self.engine.run_tick(generation).await
    }

    /// Spawn one tick. Its generation is assigned before this returns.
    pub fn spawn_tick(&self) -> JoinHandle<Option<Applied>> {
        spawn_tick(&self.engine)
    }

    pub fn state(&self) -> NavigationState {
        self.engine.state_tx.borrow().clone()
    }

    pub fn screen(&self) -> AppScreen {
        *self.engine.screen_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.engine.state_tx.subscribe()
    }

    pub fn start_navigation(&self) -> NavigationResult<()> {
        self.engine.act(NavigationAction::Start)
    }

    pub fn cancel_navigation(&self) -> NavigationResult<()> {
        self.engine.act(NavigationAction::Cancel)
    }

    pub fn toggle_navigation(&self) -> NavigationResult<()> {
        self.engine.act(NavigationAction::Toggle)
    }

    /// Start the session poller and the navigation tick loop.
    pub fn start(self) -> NavigatorHandle {
        info!(
            "Starting navigator (tick every {:?})",
            self.tick_interval
        );

        let poller = self
            .poller
            .spawn(self.session_tx, self.engine.shutdown.clone());
        let ticks = tokio::spawn(tick_loop(
            self.engine.clone(),
            self.tick_interval,
            self.engine.shutdown.clone(),
        ));

        NavigatorHandle {
            engine: self.engine,
            shutdown_tx: self.shutdown_tx,
            tasks: vec![poller, ticks],
        }
    }
}

fn spawn_tick(engine: &Arc<Engine>) -> JoinHandle<Option<Applied>> {
    let engine = engine.clone();
    let generation = engine.next_generation();
    tokio::spawn(async move { engine.run_tick(generation).await })
}

async fn tick_loop(engine: Arc<Engine>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    // First tick fires one period after start.
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut session = engine.session.clone();
    let mut session_open = true;
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            changed = session.changed(), if session_open => {
                match changed {
                    Ok(()) => {
                        let screen = session.borrow_and_update().screen();
                        engine.publish_screen(screen);
                    }
                    Err(_) => session_open = false,
                }
            }
            _ = ticker.tick() => {
                let engine = engine.clone();
                let generation = engine.next_generation();
                in_flight.spawn(async move { engine.run_tick(generation).await });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!("Navigation tick panicked: {}", e);
                    }
                }
            }
        }
    }

    in_flight.abort_all();
    while in_flight.join_next().await.is_some() {}
    info!("Navigation tick loop stopped");
}

/// Running navigator.
///
/// Dropping the handle signals shutdown and aborts the background tasks;
/// [`NavigatorHandle::shutdown`] does the same but waits for them to finish.
pub struct NavigatorHandle {
    engine: Arc<Engine>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NavigatorHandle {
    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.engine.state_tx.subscribe()
    }

    pub fn subscribe_screen(&self) -> watch::Receiver<AppScreen> {
        self.engine.screen_tx.subscribe()
    }

    pub fn state(&self) -> NavigationState {
        self.engine.state_tx.borrow().clone()
    }

    pub fn screen(&self) -> AppScreen {
        *self.engine.screen_tx.borrow()
    }

    pub fn start_navigation(&self) -> NavigationResult<()> {
        self.engine.act(NavigationAction::Start)
    }

    pub fn cancel_navigation(&self) -> NavigationResult<()> {
        self.engine.act(NavigationAction::Cancel)
    }

    pub fn toggle_navigation(&self) -> NavigationResult<()> {
        self.engine.act(NavigationAction::Toggle)
    }

    /// Stop polling and wait for the background tasks to exit.
    pub async fn shutdown(mut self) {
        self.shutdown_tx.send_replace(true);
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!("Navigator task panicked during shutdown: {}", e);
                }
            }
        }
        info!("Navigator stopped");
    }
}

impl Drop for NavigatorHandle {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
