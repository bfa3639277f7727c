//! Navigation state machine.
//!
//! Owns the observable [`NavigationState`]. Tick results move it forward
//! (`Loading` to `NoClassesToday` or `PreviewingRoute`); the only backward
//! edge is the user cancelling navigation, which lands on `PreviewingRoute`.
//! `Loading` is never re-entered.
//!
//! ```text
//!            no classes                     route obtained
//!   Loading ───────────► NoClassesToday ◄── (any state, on no-classes tick)
//!      │
//!      │ route obtained        start / toggle
//!      └──────────────► PreviewingRoute ◄────────► Navigating
//!      │                                 cancel / toggle
//!      │ failure_threshold consecutive failed ticks
//!      └──────────────► Unavailable ── data arrives ──► (forward as above)
//! ```

use log::{debug, info};

use crate::api::{ClassEntry, NavigationState, RouteResult};
use crate::config::TickOrdering;
use crate::error::{NavigationError, NavigationResult};

/// Result of one orchestrator tick, ready to be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Today's day-slot is empty.
    NoClasses,
    /// A class was resolved and a route obtained for it.
    Route {
        next_class: ClassEntry,
        route: RouteResult,
    },
    /// The tick completed but nothing is left to show today.
    Unresolved,
    /// Location, schedule data or route failure. `next_class` is set when
    /// the resolver picked a class before the route request failed.
    Failed {
        reason: String,
        next_class: Option<ClassEntry>,
    },
}

impl TickOutcome {
    /// Failure before any class was resolved.
    pub fn failed(reason: impl Into<String>) -> Self {
        TickOutcome::Failed {
            reason: reason.into(),
            next_class: None,
        }
    }
}

/// User-facing navigation controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    Start,
    Cancel,
    Toggle,
}

impl NavigationAction {
    fn label(self) -> &'static str {
        match self {
            NavigationAction::Start => "start navigation",
            NavigationAction::Cancel => "cancel navigation",
            NavigationAction::Toggle => "toggle navigation",
        }
    }
}

/// How [`NavigationMachine::apply`] treated a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A newer tick was already applied; the outcome was dropped.
    Stale,
    Unchanged,
    Changed,
}

#[derive(Debug, Clone)]
pub struct NavigationMachine {
    state: NavigationState,
    ordering: TickOrdering,
    failure_threshold: u32,
    consecutive_failures: u32,
    last_applied_generation: u64,
}

impl NavigationMachine {
    pub fn new(failure_threshold: u32, ordering: TickOrdering) -> Self {
        Self {
            state: NavigationState::Loading,
            ordering,
            failure_threshold: failure_threshold.max(1),
            consecutive_failures: 0,
            last_applied_generation: 0,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_applied_generation(&self) -> u64 {
        self.last_applied_generation
    }

    /// Apply the outcome of tick `generation`.
    ///
    /// With [`TickOrdering::LatestRequest`] an outcome from a tick older than
    /// the last applied one is discarded. With
    /// [`TickOrdering::LastCompletion`] every outcome is applied in completion
    /// order.
    pub fn apply(&mut self, generation: u64, outcome: TickOutcome) -> Applied {
        if self.ordering == TickOrdering::LatestRequest
            && generation <= self.last_applied_generation
        {
            debug!(
                "Discarding stale tick {} (last applied {})",
                generation, self.last_applied_generation
            );
            return Applied::Stale;
        }
        self.last_applied_generation = generation;

        let next = match outcome {
            TickOutcome::NoClasses => {
                self.consecutive_failures = 0;
                Some(NavigationState::NoClassesToday)
            }
            TickOutcome::Route { next_class, route } => {
                self.consecutive_failures = 0;
                Some(match self.state {
                    NavigationState::Navigating { .. } => {
                        NavigationState::Navigating { next_class, route }
                    }
                    _ => NavigationState::PreviewingRoute { next_class, route },
                })
            }
            TickOutcome::Unresolved => {
                self.consecutive_failures = 0;
                None
            }
            TickOutcome::Failed { reason, next_class } => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                match (&self.state, next_class) {
                    // The route stays stale but the resolved class is current.
                    (NavigationState::PreviewingRoute { route, .. }, Some(next_class)) => {
                        Some(NavigationState::PreviewingRoute {
                            next_class,
                            route: route.clone(),
                        })
                    }
                    (NavigationState::Navigating { route, .. }, Some(next_class)) => {
                        Some(NavigationState::Navigating {
                            next_class,
                            route: route.clone(),
                        })
                    }
                    (NavigationState::Loading | NavigationState::Unavailable { .. }, _)
                        if self.consecutive_failures >= self.failure_threshold =>
                    {
                        Some(NavigationState::Unavailable { reason })
                    }
                    _ => None,
                }
            }
        };

        match next {
            Some(state) => self.transition(state),
            None => Applied::Unchanged,
        }
    }

    /// Apply a user action.
    pub fn act(&mut self, action: NavigationAction) -> NavigationResult<()> {
        let next = match (action, &self.state) {
            (
                NavigationAction::Start | NavigationAction::Toggle,
                NavigationState::PreviewingRoute { next_class, route },
            ) => NavigationState::Navigating {
                next_class: next_class.clone(),
                route: route.clone(),
            },
            (
                NavigationAction::Cancel | NavigationAction::Toggle,
                NavigationState::Navigating { next_class, route },
            ) => NavigationState::PreviewingRoute {
                next_class: next_class.clone(),
                route: route.clone(),
            },
            (action, state) => {
                return Err(NavigationError::InvalidTransition {
                    action: action.label(),
                    state: state.name(),
                })
            }
        };
        self.transition(next);
        Ok(())
    }

    pub fn start_navigation(&mut self) -> NavigationResult<()> {
        self.act(NavigationAction::Start)
    }

    pub fn cancel_navigation(&mut self) -> NavigationResult<()> {
        self.act(NavigationAction::Cancel)
    }

    pub fn toggle_navigation(&mut self) -> NavigationResult<()> {
        self.act(NavigationAction::Toggle)
    }

    fn transition(&mut self, next: NavigationState) -> Applied {
        if next == self.state {
            return Applied::Unchanged;
        }
        if next.name() != self.state.name() {
            info!("Navigation state: {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
        Applied::Changed
    }
}

impl Default for NavigationMachine {
    fn default() -> Self {
        Self::new(3, TickOrdering::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(minutes: u32) -> RouteResult {
        RouteResult {
            nodes: vec![],
            edges: vec![],
            minutes_needed: minutes,
            distance_meters: minutes * 80,
        }
    }

    fn class(course: &str) -> ClassEntry {
        ClassEntry::new(course, "Bourns Hall", "2024-01-01T14:30:00")
    }

    fn routed(course: &str, minutes: u32) -> TickOutcome {
        TickOutcome::Route {
            next_class: class(course),
            route: route(minutes),
        }
    }

    fn previewing() -> NavigationMachine {
        let mut machine = NavigationMachine::default();
        machine.apply(1, routed("CS 100", 5));
        machine
    }

    #[test]
    fn test_starts_loading() {
        let machine = NavigationMachine::default();
        assert_eq!(machine.state(), &NavigationState::Loading);
    }

    #[test]
    fn test_loading_to_no_classes() {
        let mut machine = NavigationMachine::default();
        assert_eq!(machine.apply(1, TickOutcome::NoClasses), Applied::Changed);
        assert_eq!(machine.state(), &NavigationState::NoClassesToday);
    }

    #[test]
    fn test_loading_to_previewing() {
        let machine = previewing();
        assert_eq!(machine.state().name(), "previewing_route");
        assert_eq!(machine.state().route().unwrap().minutes_needed, 5);
        assert_eq!(machine.state().next_class().unwrap().course_number, "CS 100");
    }

    #[test]
    fn test_start_then_cancel_returns_to_preview() {
        let mut machine = previewing();

        machine.start_navigation().unwrap();
        assert_eq!(machine.state().name(), "navigating");

        machine.cancel_navigation().unwrap();
        assert_eq!(machine.state().name(), "previewing_route");
        assert_eq!(machine.state().route().unwrap().minutes_needed, 5);
    }

    #[test]
    fn test_toggle_flips() {
        let mut machine = previewing();
        machine.toggle_navigation().unwrap();
        assert_eq!(machine.state().name(), "navigating");
        machine.toggle_navigation().unwrap();
        assert_eq!(machine.state().name(), "previewing_route");
    }

    #[test]
    fn test_actions_rejected_without_route() {
        let mut machine = NavigationMachine::default();
        let err = machine.start_navigation().unwrap_err();
        assert!(matches!(
            err,
            NavigationError::InvalidTransition {
                action: "start navigation",
                state: "loading"
            }
        ));
        assert!(machine.toggle_navigation().is_err());

        let mut machine = previewing();
        assert!(machine.cancel_navigation().is_err());
        machine.start_navigation().unwrap();
        assert!(machine.start_navigation().is_err());
    }

    #[test]
    fn test_route_refresh_keeps_navigating() {
        let mut machine = previewing();
        machine.start_navigation().unwrap();

        assert_eq!(machine.apply(2, routed("CS 100", 3)), Applied::Changed);
        assert_eq!(machine.state().name(), "navigating");
        assert_eq!(machine.state().route().unwrap().minutes_needed, 3);
    }

    #[test]
    fn test_identical_route_is_unchanged() {
        let mut machine = previewing();
        assert_eq!(machine.apply(2, routed("CS 100", 5)), Applied::Unchanged);
    }

    #[test]
    fn test_no_classes_overrides_navigating() {
        let mut machine = previewing();
        machine.start_navigation().unwrap();
        machine.apply(2, TickOutcome::NoClasses);
        assert_eq!(machine.state(), &NavigationState::NoClassesToday);
    }

    #[test]
    fn test_unresolved_leaves_state() {
        let mut machine = previewing();
        assert_eq!(machine.apply(2, TickOutcome::Unresolved), Applied::Unchanged);
        assert_eq!(machine.state().name(), "previewing_route");

        let mut machine = NavigationMachine::default();
        machine.apply(1, TickOutcome::Unresolved);
        assert_eq!(machine.state(), &NavigationState::Loading);
    }

    #[test]
    fn test_failure_keeps_stale_route() {
        let mut machine = previewing();
        for generation in 2..10 {
            machine.apply(generation, TickOutcome::failed("route service down"));
        }
        assert_eq!(machine.state().name(), "previewing_route");
        assert_eq!(machine.state().route().unwrap().minutes_needed, 5);
        assert_eq!(machine.consecutive_failures(), 8);
    }

    #[test]
    fn test_route_failure_updates_class_on_stale_route() {
        let mut machine = previewing();
        let failed = TickOutcome::Failed {
            reason: "route service down".into(),
            next_class: Some(class("CS 200")),
        };
        assert_eq!(machine.apply(2, failed), Applied::Changed);
        assert_eq!(machine.state().name(), "previewing_route");
        assert_eq!(machine.state().next_class().unwrap().course_number, "CS 200");
        assert_eq!(machine.state().route().unwrap().minutes_needed, 5);

        machine.start_navigation().unwrap();
        let failed = TickOutcome::Failed {
            reason: "route service down".into(),
            next_class: Some(class("CS 300")),
        };
        machine.apply(3, failed);
        assert_eq!(machine.state().name(), "navigating");
        assert_eq!(machine.state().next_class().unwrap().course_number, "CS 300");
        assert_eq!(machine.state().route().unwrap().minutes_needed, 5);
        assert_eq!(machine.consecutive_failures(), 2);
    }

    #[test]
    fn test_route_failure_before_first_route_counts_toward_unavailable() {
        let mut machine = NavigationMachine::new(1, TickOrdering::LatestRequest);
        machine.apply(
            1,
            TickOutcome::Failed {
                reason: "route service down".into(),
                next_class: Some(class("CS 200")),
            },
        );
        assert_eq!(
            machine.state(),
            &NavigationState::Unavailable {
                reason: "route service down".into()
            }
        );
    }

    #[test]
    fn test_unavailable_after_threshold() {
        let mut machine = NavigationMachine::new(2, TickOrdering::LatestRequest);

        machine.apply(1, TickOutcome::failed("denied"));
        assert_eq!(machine.state(), &NavigationState::Loading);

        assert_eq!(
            machine.apply(2, TickOutcome::failed("denied")),
            Applied::Changed
        );
        assert_eq!(
            machine.state(),
            &NavigationState::Unavailable {
                reason: "denied".into()
            }
        );

        machine.apply(3, TickOutcome::failed("timeout"));
        assert_eq!(
            machine.state(),
            &NavigationState::Unavailable {
                reason: "timeout".into()
            }
        );

        machine.apply(4, routed("CS 100", 5));
        assert_eq!(machine.state().name(), "previewing_route");
        assert_eq!(machine.consecutive_failures(), 0);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let mut machine = NavigationMachine::new(2, TickOrdering::LatestRequest);
        machine.apply(1, TickOutcome::failed("a"));
        machine.apply(2, TickOutcome::Unresolved);
        machine.apply(3, TickOutcome::failed("b"));
        assert_eq!(machine.state(), &NavigationState::Loading);
    }

    #[test]
    fn test_latest_request_discards_stale_tick() {
        let mut machine = NavigationMachine::new(3, TickOrdering::LatestRequest);
        assert_eq!(machine.apply(2, routed("NEW", 2)), Applied::Changed);
        assert_eq!(machine.apply(1, routed("OLD", 9)), Applied::Stale);
        assert_eq!(machine.state().next_class().unwrap().course_number, "NEW");
        assert_eq!(machine.last_applied_generation(), 2);
    }

    #[test]
    fn test_last_completion_lets_stale_tick_win() {
        let mut machine = NavigationMachine::new(3, TickOrdering::LastCompletion);
        machine.apply(2, routed("NEW", 2));
        assert_eq!(machine.apply(1, routed("OLD", 9)), Applied::Changed);
        assert_eq!(machine.state().next_class().unwrap().course_number, "OLD");
    }
}
