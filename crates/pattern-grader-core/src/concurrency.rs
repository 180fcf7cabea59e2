//! # Concurrency Probe
//!
//! Calls a shared accessor from many threads at once and reports how many
//! distinct instances came back.
//!
//! All callers wait behind a gate that opens only after every thread has been
//! spawned, so the calls overlap as much as the scheduler allows. Observed
//! instances are kept alive until counting finishes; identity keys are
//! allocation addresses and would be reused if an instance were dropped early.

use crate::prober::SharedAccessor;
use crate::types::{Instance, ProbeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Default number of concurrent callers.
pub const DEFAULT_CALLERS: usize = 50;

/// Default completion bound in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// What the probe observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyOutcome {
    /// Every caller received the same instance.
    Consistent { callers: usize },
    /// More than one instance was handed out.
    Diverged { distinct: usize, callers: usize },
    /// At least one caller failed.
    CallerFailed { failures: usize, first: String },
    /// Not every caller finished within the bound.
    TimedOut {
        completed: usize,
        callers: usize,
        timeout_ms: u64,
    },
    /// The callers could not be started.
    SpawnFailed(String),
}

impl ConcurrencyOutcome {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        matches!(self, ConcurrencyOutcome::Consistent { .. })
    }
}

impl std::fmt::Display for ConcurrencyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcurrencyOutcome::Consistent { callers } => {
                write!(f, "{callers} concurrent callers received the same instance")
            }
            ConcurrencyOutcome::Diverged { distinct, callers } => write!(
                f,
                "{distinct} distinct instances handed to {callers} concurrent callers"
            ),
            ConcurrencyOutcome::CallerFailed { failures, first } => {
                write!(f, "{failures} concurrent caller(s) failed, first: {first}")
            }
            ConcurrencyOutcome::TimedOut {
                completed,
                callers,
                timeout_ms,
            } => write!(
                f,
                "inconclusive: only {completed} of {callers} callers finished within {timeout_ms} ms"
            ),
            ConcurrencyOutcome::SpawnFailed(reason) => {
                write!(f, "could not start concurrent callers: {reason}")
            }
        }
    }
}

/// A start gate shared by all callers.
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    signal: Condvar,
}

impl Gate {
    fn open(&self) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        *open = true;
        self.signal.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        while !*open {
            open = self
                .signal
                .wait(open)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Concurrent single-instance probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyProbe {
    callers: usize,
    timeout_ms: u64,
}

impl Default for ConcurrencyProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CALLERS, DEFAULT_TIMEOUT_MS)
    }
}

impl ConcurrencyProbe {
    /// At least one caller is always used.
    #[must_use]
    pub fn new(callers: usize, timeout_ms: u64) -> Self {
        Self {
            callers: callers.max(1),
            timeout_ms,
        }
    }

    #[must_use]
    pub fn callers(&self) -> usize {
        self.callers
    }

    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Run the probe. Never retried.
    pub fn run(&self, accessor: &SharedAccessor) -> ConcurrencyOutcome {
        let gate = Arc::new(Gate::default());
        let observed: Arc<Mutex<Vec<Instance>>> =
            Arc::new(Mutex::new(Vec::with_capacity(self.callers)));
        let (tx, rx) = mpsc::channel::<Result<(), ProbeError>>();

        for index in 0..self.callers {
            let caller_gate = Arc::clone(&gate);
            let observed = Arc::clone(&observed);
            let accessor = accessor.clone();
            let tx = tx.clone();

            let spawned = thread::Builder::new()
                .name(format!("concurrency-probe-{index}"))
                .spawn(move || {
                    caller_gate.wait();
                    let report = accessor.call().map(|instance| {
                        observed
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(instance);
                    });
                    // The receiver may have given up after a timeout.
                    let _ = tx.send(report);
                });

            if let Err(err) = spawned {
                // Release the callers already waiting so they can exit.
                gate.open();
                tracing::warn!(error = %err, "Failed to spawn concurrency probe caller");
                return ConcurrencyOutcome::SpawnFailed(err.to_string());
            }
        }
        drop(tx);

        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.timeout_ms);
        gate.open();

        let mut completed = 0_usize;
        let mut failures = 0_usize;
        let mut first_failure: Option<String> = None;

        while completed < self.callers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Ok(())) => completed += 1,
                Ok(Err(err)) => {
                    completed += 1;
                    failures += 1;
                    first_failure.get_or_insert_with(|| err.to_string());
                }
                Err(RecvTimeoutError::Timeout) => {
                    let outcome = ConcurrencyOutcome::TimedOut {
                        completed,
                        callers: self.callers,
                        timeout_ms: self.timeout_ms,
                    };
                    tracing::warn!(%outcome, "Concurrency probe timed out");
                    return outcome;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    // A caller died without reporting.
                    let missing = self.callers - completed;
                    failures += missing;
                    first_failure
                        .get_or_insert_with(|| "caller exited without reporting".to_string());
                    break;
                }
            }
        }

        let outcome = if failures > 0 {
            ConcurrencyOutcome::CallerFailed {
                failures,
                first: first_failure.unwrap_or_default(),
            }
        } else {
            let observed = observed.lock().unwrap_or_else(PoisonError::into_inner);
            let distinct = observed
                .iter()
                .map(Instance::identity)
                .collect::<BTreeSet<_>>()
                .len();
            if distinct == 1 {
                ConcurrencyOutcome::Consistent {
                    callers: self.callers,
                }
            } else {
                ConcurrencyOutcome::Diverged {
                    distinct,
                    callers: self.callers,
                }
            }
        };

        if outcome.is_consistent() {
            tracing::info!(
                callers = self.callers,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Concurrency probe consistent"
            );
        } else {
            tracing::warn!(%outcome, "Concurrency probe failed");
        }
        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, MemberDescriptor, TypeDescriptor};
    use crate::predicates::matcher;
    use crate::prober::Prober;
    use crate::types::{Raised, Value};
    use std::sync::OnceLock;

    struct Node;

    fn accessor_for(member: MemberDescriptor) -> SharedAccessor {
        let manifest = Arc::new(
            Manifest::new("demo").with_type(TypeDescriptor::class("Node").member(member)),
        );
        let prober = Prober::new(manifest);
        let node = prober.resolve_type("Node").expect("node");
        let member = prober
            .find_member(node, &matcher("getInstance", |m| m.name == "getInstance"))
            .expect("member");
        prober.shared_accessor(member).expect("accessor")
    }

    #[test]
    fn cached_instance_is_consistent() {
        let cell: Arc<OnceLock<Instance>> = Arc::new(OnceLock::new());
        let accessor = accessor_for(
            MemberDescriptor::static_method("getInstance")
                .returns("Node")
                .body(move |_, _| {
                    Ok(Value::Object(
                        cell.get_or_init(|| Instance::new("Node", Node)).clone(),
                    ))
                }),
        );

        for _ in 0..3 {
            let outcome = ConcurrencyProbe::new(50, 10_000).run(&accessor);
            assert_eq!(outcome, ConcurrencyOutcome::Consistent { callers: 50 });
        }
    }

    #[test]
    fn fresh_instances_diverge() {
        let accessor = accessor_for(
            MemberDescriptor::static_method("getInstance")
                .returns("Node")
                .body(|_, _| Ok(Value::Object(Instance::new("Node", Node)))),
        );

        let outcome = ConcurrencyProbe::new(50, 10_000).run(&accessor);
        assert!(matches!(
            outcome,
            ConcurrencyOutcome::Diverged { distinct: 50, callers: 50 }
        ));
    }

    #[test]
    fn raising_callers_fail() {
        let accessor = accessor_for(
            MemberDescriptor::static_method("getInstance")
                .returns("Node")
                .body(|_, _| Err(Raised::new("not ready"))),
        );

        match ConcurrencyProbe::new(8, 10_000).run(&accessor) {
            ConcurrencyOutcome::CallerFailed { failures, first } => {
                assert_eq!(failures, 8);
                assert!(first.contains("not ready"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn slow_callers_time_out() {
        let accessor = accessor_for(
            MemberDescriptor::static_method("getInstance")
                .returns("Node")
                .body(|_, _| {
                    thread::sleep(Duration::from_millis(500));
                    Ok(Value::Object(Instance::new("Node", Node)))
                }),
        );

        let outcome = ConcurrencyProbe::new(4, 20).run(&accessor);
        assert!(matches!(outcome, ConcurrencyOutcome::TimedOut { callers: 4, .. }));
        assert!(outcome.to_string().starts_with("inconclusive"));
    }

    #[test]
    fn zero_callers_clamped() {
        assert_eq!(ConcurrencyProbe::new(0, 5).callers(), 1);
    }
}
