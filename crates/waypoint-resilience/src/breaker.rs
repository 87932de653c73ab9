// SPDX-FileCopyrightText: 2026 Waypoint Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circuit breaker state machine.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use waypoint_core::WaypointError;

/// Thresholds for one breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long an open circuit rejects calls before admitting a probe.
    pub reset_timeout: Duration,
    /// Consecutive probe successes that close a half-open circuit.
    pub half_open_success_threshold: u32,
    /// Deadline applied to every guarded call.
    pub call_timeout: Option<Duration>,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(20),
            half_open_success_threshold: 1,
            call_timeout: None,
        }
    }
}

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitStatus::Closed => write!(f, "closed"),
            CircuitStatus::Open => write!(f, "open"),
            CircuitStatus::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// A consistent copy of a breaker's counters.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitSnapshot {
    pub name: String,
    pub status: CircuitStatus,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub opened_at: Option<Instant>,
}

/// Returned when an open circuit rejects a call without attempting it.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("circuit `{name}` is open; next probe allowed in {retry_in:?}")]
pub struct CircuitOpenError {
    pub name: String,
    pub retry_in: Duration,
}

/// Outcome of a guarded call that did not succeed.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The circuit was open; the operation was never started.
    #[error(transparent)]
    Open(CircuitOpenError),
    /// The operation ran and returned an error.
    #[error("guarded call failed: {0}")]
    Failed(E),
    /// The operation exceeded the breaker's call timeout.
    #[error("guarded call timed out after {0:?}")]
    TimedOut(Duration),
    /// The caller cancelled the operation.
    #[error("guarded call cancelled")]
    Cancelled,
}

impl<E> BreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open(_))
    }
}

impl From<BreakerError<WaypointError>> for WaypointError {
    fn from(err: BreakerError<WaypointError>) -> Self {
        match err {
            BreakerError::Open(open) => WaypointError::CircuitOpen { name: open.name },
            BreakerError::Failed(inner) => inner,
            BreakerError::TimedOut(duration) => WaypointError::Timeout { duration },
            BreakerError::Cancelled => WaypointError::Cancelled,
        }
    }
}

/// Callback invoked on every state transition with the breaker name and new state.
pub type TransitionObserver = Arc<dyn Fn(&str, CircuitStatus) + Send + Sync>;

#[derive(Debug)]
struct CircuitState {
    status: CircuitStatus,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
}

/// A named circuit breaker shared by every caller of one dependency.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    state: Mutex<CircuitState>,
    observer: Option<TransitionObserver>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &*self.lock())
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(CircuitState {
                status: CircuitStatus::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                opened_at: None,
            }),
            observer: None,
        }
    }

    /// Registers a transition callback (metrics, alerts).
    pub fn with_observer(mut self, observer: TransitionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current state. An expired Open state reads as Open until the next call.
    pub fn status(&self) -> CircuitStatus {
        self.lock().status
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let state = self.lock();
        CircuitSnapshot {
            name: self.name.clone(),
            status: state.status,
            consecutive_failures: state.consecutive_failures,
            consecutive_successes: state.consecutive_successes,
            opened_at: state.opened_at,
        }
    }

    /// Runs `f` through the breaker.
    ///
    /// Rejects immediately with [`BreakerError::Open`] while the circuit is open;
    /// otherwise awaits the call (bounded by the configured call timeout) and
    /// records its outcome.
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(None, f).await
    }

    /// Like [`execute`](Self::execute), abandoning the call when `cancel` fires.
    ///
    /// A cancelled call counts as a failure.
    pub async fn execute_with_cancel<F, Fut, T, E>(
        &self,
        cancel: &CancellationToken,
        f: F,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(Some(cancel), f).await
    }

    async fn run<F, Fut, T, E>(
        &self,
        cancel: Option<&CancellationToken>,
        f: F,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.admit().map_err(BreakerError::Open)?;

        let call = async {
            match self.config.call_timeout {
                Some(limit) => match tokio::time::timeout(limit, f()).await {
                    Ok(result) => result.map_err(BreakerError::Failed),
                    Err(_) => Err(BreakerError::TimedOut(limit)),
                },
                None => f().await.map_err(BreakerError::Failed),
            }
        };

        let result = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(BreakerError::Cancelled),
                    result = call => result,
                }
            }
            None => call.await,
        };

        match &result {
            Ok(_) => self.record_success(),
            Err(err) => {
                let kind = match err {
                    BreakerError::TimedOut(_) => "timeout",
                    BreakerError::Cancelled => "cancelled",
                    _ => "error",
                };
                self.record_failure(kind);
            }
        }
        result
    }

    fn admit(&self) -> Result<(), CircuitOpenError> {
        let mut state = self.lock();
        if state.status != CircuitStatus::Open {
            return Ok(());
        }

        let opened_at = state.opened_at.unwrap_or_else(Instant::now);
        let elapsed = opened_at.elapsed();
        if elapsed >= self.config.reset_timeout {
            state.consecutive_successes = 0;
            self.transition(&mut state, CircuitStatus::HalfOpen);
            drop(state);
            self.notify(CircuitStatus::HalfOpen);
            return Ok(());
        }

        debug!(breaker = %self.name, "call rejected: circuit open");
        Err(CircuitOpenError {
            name: self.name.clone(),
            retry_in: self.config.reset_timeout - elapsed,
        })
    }

    fn record_success(&self) {
        let mut state = self.lock();
        let changed = match state.status {
            CircuitStatus::Closed => {
                state.consecutive_failures = 0;
                None
            }
            CircuitStatus::HalfOpen => {
                state.consecutive_successes += 1;
                if state.consecutive_successes >= self.config.half_open_success_threshold {
                    state.consecutive_failures = 0;
                    state.consecutive_successes = 0;
                    state.opened_at = None;
                    self.transition(&mut state, CircuitStatus::Closed);
                    Some(CircuitStatus::Closed)
                } else {
                    None
                }
            }
            // A call admitted before the circuit reopened; the open timer stands.
            CircuitStatus::Open => None,
        };
        drop(state);
        if let Some(to) = changed {
            self.notify(to);
        }
    }

    fn record_failure(&self, kind: &'static str) {
        let mut state = self.lock();
        state.consecutive_successes = 0;
        let changed = match state.status {
            CircuitStatus::Closed => {
                state.consecutive_failures += 1;
                warn!(
                    breaker = %self.name,
                    kind,
                    consecutive_failures = state.consecutive_failures,
                    "guarded call failed"
                );
                if state.consecutive_failures >= self.config.failure_threshold {
                    state.opened_at = Some(Instant::now());
                    self.transition(&mut state, CircuitStatus::Open);
                    Some(CircuitStatus::Open)
                } else {
                    None
                }
            }
            CircuitStatus::HalfOpen => {
                state.consecutive_failures += 1;
                warn!(breaker = %self.name, kind, "probe failed");
                state.opened_at = Some(Instant::now());
                self.transition(&mut state, CircuitStatus::Open);
                Some(CircuitStatus::Open)
            }
            CircuitStatus::Open => {
                state.consecutive_failures += 1;
                None
            }
        };
        drop(state);
        if let Some(to) = changed {
            self.notify(to);
        }
    }

    fn transition(&self, state: &mut CircuitState, to: CircuitStatus) {
        let from = state.status;
        state.status = to;
        info!(breaker = %self.name, %from, %to, "circuit breaker transition");
    }

    /// Runs the observer. The state lock must not be held.
    fn notify(&self, to: CircuitStatus) {
        if let Some(observer) = &self.observer {
            observer(&self.name, to);
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn breaker(threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            BreakerConfig {
                failure_threshold: threshold,
                reset_timeout: Duration::from_millis(1000),
                half_open_success_threshold: 1,
                call_timeout: None,
            },
        )
    }

    async fn fail(b: &CircuitBreaker) -> Result<(), BreakerError<&'static str>> {
        b.execute(|| async { Err::<(), _>("boom") }).await
    }

    async fn succeed(b: &CircuitBreaker) -> Result<u8, BreakerError<&'static str>> {
        b.execute(|| async { Ok::<_, &'static str>(1u8) }).await
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_failure_count() {
        let b = breaker(3);
        fail(&b).await.unwrap_err();
        fail(&b).await.unwrap_err();
        succeed(&b).await.unwrap();
        fail(&b).await.unwrap_err();
        fail(&b).await.unwrap_err();
        assert_eq!(b.status(), CircuitStatus::Closed);
        assert_eq!(b.snapshot().consecutive_failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens_and_restarts_timer() {
        let b = breaker(1);
        fail(&b).await.unwrap_err();
        assert_eq!(b.status(), CircuitStatus::Open);

        tokio::time::advance(Duration::from_millis(1000)).await;
        fail(&b).await.unwrap_err();
        assert_eq!(b.status(), CircuitStatus::Open);

        // The timer restarted at the probe failure.
        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(succeed(&b).await.unwrap_err().is_open());
        tokio::time::advance(Duration::from_millis(1)).await;
        succeed(&b).await.unwrap();
        assert_eq!(b.status(), CircuitStatus::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_needs_configured_successes() {
        let b = CircuitBreaker::new(
            "probe",
            BreakerConfig {
                failure_threshold: 1,
                reset_timeout: Duration::from_millis(10),
                half_open_success_threshold: 2,
                call_timeout: None,
            },
        );
        fail(&b).await.unwrap_err();
        tokio::time::advance(Duration::from_millis(10)).await;

        succeed(&b).await.unwrap();
        assert_eq!(b.status(), CircuitStatus::HalfOpen);
        succeed(&b).await.unwrap();
        assert_eq!(b.status(), CircuitStatus::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn open_error_reports_remaining_cooldown() {
        let b = breaker(1);
        fail(&b).await.unwrap_err();
        tokio::time::advance(Duration::from_millis(400)).await;
        match succeed(&b).await {
            Err(BreakerError::Open(open)) => {
                assert_eq!(open.name, "test");
                assert_eq!(open.retry_in, Duration::from_millis(600));
            }
            other => panic!("expected open rejection, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn call_timeout_counts_as_failure() {
        let b = CircuitBreaker::new(
            "slow",
            BreakerConfig {
                failure_threshold: 1,
                call_timeout: Some(Duration::from_millis(50)),
                ..BreakerConfig::default()
            },
        );
        let result = b
            .execute(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, &'static str>(())
            })
            .await;
        assert!(matches!(result, Err(BreakerError::TimedOut(d)) if d == Duration::from_millis(50)));
        assert_eq!(b.status(), CircuitStatus::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_counts_as_failure() {
        let b = breaker(1);
        let token = CancellationToken::new();
        token.cancel();
        let result = b
            .execute_with_cancel(&token, || async { Ok::<_, &'static str>(()) })
            .await;
        assert!(matches!(result, Err(BreakerError::Cancelled)));
        assert_eq!(b.status(), CircuitStatus::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn observer_sees_every_transition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let b = breaker(1).with_observer(Arc::new(move |name: &str, to: CircuitStatus| {
            sink.lock().unwrap().push(format!("{name}:{to}"));
        }));

        fail(&b).await.unwrap_err();
        tokio::time::advance(Duration::from_millis(1000)).await;
        succeed(&b).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["test:open", "test:half_open", "test:closed"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn observer_may_read_the_breaker_it_watches() {
        let cell: Arc<std::sync::OnceLock<Arc<CircuitBreaker>>> = Arc::new(std::sync::OnceLock::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (reader, sink) = (cell.clone(), seen.clone());
        let b = Arc::new(breaker(1).with_observer(Arc::new(move |_: &str, to: CircuitStatus| {
            let current = reader.get().map(|b| b.snapshot().status);
            sink.lock().unwrap().push((to, current));
        })));
        cell.set(b.clone()).ok();

        fail(&b).await.unwrap_err();
        tokio::time::advance(Duration::from_millis(1000)).await;
        succeed(&b).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (CircuitStatus::Open, Some(CircuitStatus::Open)),
                (CircuitStatus::HalfOpen, Some(CircuitStatus::HalfOpen)),
                (CircuitStatus::Closed, Some(CircuitStatus::Closed)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_calls_never_run() {
        let b = breaker(1);
        fail(&b).await.unwrap_err();

        let calls = AtomicU32::new(0);
        let result = b
            .execute(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &'static str>(())
            })
            .await;
        assert!(result.unwrap_err().is_open());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn breaker_error_converts_into_waypoint_error() {
        let open: BreakerError<WaypointError> = BreakerError::Open(CircuitOpenError {
            name: "strategy_engine".into(),
            retry_in: Duration::from_secs(1),
        });
        assert!(matches!(
            WaypointError::from(open),
            WaypointError::CircuitOpen { name } if name == "strategy_engine"
        ));
        let timed: BreakerError<WaypointError> = BreakerError::TimedOut(Duration::from_secs(2));
        assert!(matches!(
            WaypointError::from(timed),
            WaypointError::Timeout { .. }
        ));
    }
}
