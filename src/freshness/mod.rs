//! Staleness gate for the watched dashboard data files.
//!
//! Every read of `data/<watched file>` passes through
//! [`FreshnessTracker::maybe_regenerate`] before the static response is
//! produced. The tracker decides whether the generated data has outlived
//! its TTL and, when it has, runs the regenerator while holding an
//! exclusive in-flight lock. Requests that lose the lock race are served
//! immediately from whatever is on disk: under contention, stale data is
//! acceptable and waiting is not.

use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::regen::{RegenOutcome, Regenerate};

/// Path prefix under the web root whose files are staleness-tracked.
pub const WATCHED_PREFIX: &str = "data/";

/// Generated files eligible for regeneration, matched by basename.
pub const WATCHED_FILES: [&str; 4] = [
    "slots.json",
    "ready.json",
    "notifications.json",
    "mayor.json",
];

/// Returns the watched basename for a request path, if it has one.
///
/// A path qualifies when it starts with `data/` (after leading slashes)
/// and its final segment is one of [`WATCHED_FILES`], at any depth below
/// the prefix. Callers strip query strings before matching.
pub fn watched_basename(request_path: &str) -> Option<&str> {
    let rel = request_path
        .trim_start_matches('/')
        .strip_prefix(WATCHED_PREFIX)?;
    let name = rel.rsplit('/').next()?;
    WATCHED_FILES.contains(&name).then_some(name)
}

/// Shared regeneration state: one instance per server, handed by shared
/// ownership to every request handler.
///
/// Guarantees at most one regenerator process in flight system-wide, no
/// matter how many concurrent requests observe stale data.
pub struct FreshnessTracker {
    ttl: Duration,
    /// Completion time of the last regenerator run that counted for
    /// freshness. `None` until the first run completes, so a fresh server
    /// always regenerates on the first watched request.
    last_success: RwLock<Option<Instant>>,
    /// Held for the duration of a regenerator run. Only ever acquired with
    /// `try_lock`; a request never queues behind an in-flight run.
    in_flight: Mutex<()>,
    runner: Box<dyn Regenerate>,
}

impl FreshnessTracker {
    pub fn new(ttl: Duration, runner: Box<dyn Regenerate>) -> Self {
        Self {
            ttl,
            last_success: RwLock::new(None),
            in_flight: Mutex::new(()),
            runner,
        }
    }

    /// Completion time of the last counted regenerator run.
    pub fn last_success(&self) -> Option<Instant> {
        *self.last_success.read()
    }

    /// True when the last counted run is younger than the TTL.
    fn is_fresh(&self) -> bool {
        self.last_success
            .read()
            .is_some_and(|at| at.elapsed() < self.ttl)
    }

    /// Regenerate the watched data if `request_path` reads a watched file
    /// and the data has outlived its TTL.
    ///
    /// Never fails, and never blocks behind another request's regeneration:
    /// when a run is already in flight the call returns immediately and the
    /// request is served from whatever currently exists on disk.
    ///
    /// Outcome policy: a run that completes with a non-zero exit status
    /// still refreshes the TTL window, so a persistently failing
    /// regenerator is retried once per window rather than once per request.
    /// A timeout or launch failure leaves the window stale and the next
    /// qualifying request retries.
    pub async fn maybe_regenerate(&self, request_path: &str) {
        let Some(name) = watched_basename(request_path) else {
            return;
        };

        // Advisory read. Racing with an in-flight run at worst sends us to
        // the try_lock below; it can never corrupt the timestamp.
        if self.is_fresh() {
            return;
        }

        let Ok(_guard) = self.in_flight.try_lock() else {
            crate::debug_event!("regen", "busy", "{name}: run in flight, serving as-is");
            return;
        };

        // Another request may have completed a run between the advisory
        // check and lock acquisition.
        if self.is_fresh() {
            return;
        }

        crate::debug_event!("regen", "stale", "{name}: starting regenerator");
        match self.runner.regenerate().await {
            Ok(RegenOutcome::Completed { code }) => {
                match code {
                    Some(0) => crate::debug_event!("regen", "completed"),
                    Some(c) => {
                        tracing::warn!(target: "regen", "regenerator exited with status {c}")
                    }
                    None => tracing::warn!(target: "regen", "regenerator killed by signal"),
                }
                *self.last_success.write() = Some(Instant::now());
            }
            Ok(RegenOutcome::TimedOut) => {
                tracing::error!(
                    target: "regen",
                    "regenerator timed out; next stale request will retry"
                );
            }
            Err(e) => {
                tracing::error!(target: "regen", "regeneration failed: {e}");
            }
        }
        // Guard drop releases the lock on every path above
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watched_paths_match_by_prefix_and_basename() {
        for file in WATCHED_FILES {
            let path = format!("/data/{file}");
            assert_eq!(watched_basename(&path), Some(file));
        }

        // Depth below the prefix does not matter
        assert_eq!(
            watched_basename("/data/archive/slots.json"),
            Some("slots.json")
        );

        // Repeated leading slashes are tolerated
        assert_eq!(watched_basename("//data/ready.json"), Some("ready.json"));
    }

    #[test]
    fn test_non_watched_paths_do_not_match() {
        assert_eq!(watched_basename("/index.html"), None);
        assert_eq!(watched_basename("/static/app.js"), None);
        // Right basename, wrong prefix
        assert_eq!(watched_basename("/slots.json"), None);
        assert_eq!(watched_basename("/database/slots.json"), None);
        // Right prefix, unknown basename
        assert_eq!(watched_basename("/data/other.json"), None);
        assert_eq!(watched_basename("/data/slots.json.bak"), None);
        // Bare prefix
        assert_eq!(watched_basename("/data/"), None);
    }
}
