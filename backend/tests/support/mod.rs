use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Every variable read by `NavigatorConfig::apply_env_overrides`.
pub const NAVIGATOR_VARS: &[&str] = &[
    "NAVIGATOR_ROUTE_URL",
    "NAVIGATOR_STORE_TYPE",
    "NAVIGATOR_STORE_PATH",
    "NAVIGATOR_TICK_MS",
    "NAVIGATOR_STORE_POLL_MS",
    "NAVIGATOR_CLOCK_OFFSET_MINUTES",
];

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to the process
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

/// Like [`with_scoped_env`], but every `NAVIGATOR_*` variable not listed in
/// `set` is removed first.
pub fn with_navigator_env<F, R>(set: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let mut changes: Vec<(&str, Option<&str>)> = NAVIGATOR_VARS
        .iter()
        .filter(|name| !set.iter().any(|(k, _)| k == *name))
        .map(|name| (*name, None))
        .collect();
    changes.extend(set.iter().map(|(k, v)| (*k, Some(*v))));
    with_scoped_env(&changes, f)
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
