// Top-up confirmation poller: owns the repeated status-check loop,
// terminal-state detection, the attempt budget, and cooperative
// cancellation. One session at a time; phase transitions are broadcast to
// whoever is observing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::settings::PollerSettings;
use crate::wallet::errors::WalletApiError;
use crate::wallet::types::{TopUpStatus, TopUpStatusSnapshot};

const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Where a status fetch comes from. Implemented by the REST client; tests
/// substitute scripted sources.
#[async_trait]
pub trait TopUpStatusSource: Send + Sync {
    async fn fetch_status(
        &self,
        reference_id: &str,
    ) -> Result<TopUpStatusSnapshot, WalletApiError>;
}

/// Observable lifecycle of a top-up session.
///
/// `Idle` is both the initial state and the reset state; `Success` and
/// `Failed` are terminal for the session. Between two consecutive PENDING
/// results only the attempt counter moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopUpPhase {
    Idle,
    Processing,
    Waiting { attempt: u32 },
    Success { current_balance: u64 },
    Failed { reason: String },
}

/// Update message sent to observers on every phase transition.
#[derive(Debug, Clone)]
pub struct PhaseUpdate {
    pub reference_id: Option<String>,
    pub phase: TopUpPhase,
}

/// How a polling session ended.
#[derive(Debug, Clone)]
pub enum TopUpOutcome {
    /// Gateway confirmed the payment; the snapshot's `current_balance` is
    /// the new authoritative balance.
    Completed(TopUpStatusSnapshot),
    /// Gateway reported FAILED or CANCELLED.
    Failed(TopUpStatusSnapshot),
    /// The user cancelled mid-wait. The payment may still complete
    /// server-side; transaction history remains the source of truth.
    Cancelled { attempts: u32 },
}

pub struct TopUpPoller {
    source: Arc<dyn TopUpStatusSource>,
    settings: PollerSettings,
    phase: Mutex<TopUpPhase>,
    active: AtomicBool,
    attempts: AtomicU32,
    updates: broadcast::Sender<PhaseUpdate>,
}

impl TopUpPoller {
    pub fn new(source: Arc<dyn TopUpStatusSource>, settings: PollerSettings) -> Self {
        let (updates, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            source,
            settings,
            phase: Mutex::new(TopUpPhase::Idle),
            active: AtomicBool::new(false),
            attempts: AtomicU32::new(0),
            updates,
        }
    }

    /// Subscribe to phase transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<PhaseUpdate> {
        self.updates.subscribe()
    }

    pub fn phase(&self) -> TopUpPhase {
        self.phase.lock().expect("phase lock poisoned").clone()
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Claim the session for a new submission (`Idle -> Processing`).
    /// Returns false when a session is already active.
    pub fn try_begin(&self) -> bool {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.set_phase(TopUpPhase::Processing, None);
        true
    }

    /// Abandon a claimed session whose intent was never created.
    pub fn reset(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.set_phase(TopUpPhase::Idle, None);
    }

    /// Cooperative cancellation: no further attempt is scheduled. An
    /// in-flight status check is not aborted; its continuation is
    /// discarded at the next loop check. The payment itself is not
    /// cancelled server-side.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Poll until the payment reaches a terminal state, the attempt budget
    /// runs out, or the session is cancelled. Attempts are strictly
    /// sequential; the next check is only scheduled after the previous one
    /// resolved.
    pub async fn run(&self, reference_id: &str) -> Result<TopUpOutcome, WalletApiError> {
        if !self.is_active() {
            return Err(WalletApiError::Validation {
                field: "topup",
                message: "no active top-up session".to_string(),
            });
        }

        // Processing -> Waiting: fresh attempt budget.
        self.attempts.store(0, Ordering::SeqCst);
        self.set_phase(TopUpPhase::Waiting { attempt: 0 }, Some(reference_id));
        info!(
            target: "topup_poller",
            reference_id = %reference_id,
            max_attempts = self.settings.max_attempts,
            "waiting for payment confirmation"
        );
        tokio::time::sleep(self.settings.initial_delay).await;

        loop {
            if !self.is_active() {
                let attempts = self.attempts.load(Ordering::SeqCst);
                self.set_phase(TopUpPhase::Idle, Some(reference_id));
                info!(
                    target: "topup_poller",
                    reference_id = %reference_id,
                    attempts,
                    "polling cancelled"
                );
                return Ok(TopUpOutcome::Cancelled { attempts });
            }

            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match self.source.fetch_status(reference_id).await {
                Ok(snapshot) => match snapshot.status {
                    TopUpStatus::Completed => {
                        self.active.store(false, Ordering::SeqCst);
                        self.set_phase(
                            TopUpPhase::Success {
                                current_balance: snapshot.current_balance,
                            },
                            Some(reference_id),
                        );
                        info!(
                            target: "topup_poller",
                            reference_id = %reference_id,
                            attempt,
                            current_balance = snapshot.current_balance,
                            "payment confirmed"
                        );
                        // Let observers display the success state before
                        // the session resets.
                        tokio::time::sleep(self.settings.success_linger).await;
                        self.set_phase(TopUpPhase::Idle, Some(reference_id));
                        return Ok(TopUpOutcome::Completed(snapshot));
                    }
                    TopUpStatus::Failed | TopUpStatus::Cancelled => {
                        self.active.store(false, Ordering::SeqCst);
                        let reason = match snapshot.status {
                            TopUpStatus::Cancelled => "payment was cancelled at the gateway",
                            _ => "payment failed at the gateway",
                        };
                        self.set_phase(
                            TopUpPhase::Failed {
                                reason: reason.to_string(),
                            },
                            Some(reference_id),
                        );
                        warn!(
                            target: "topup_poller",
                            reference_id = %reference_id,
                            attempt,
                            status = ?snapshot.status,
                            "payment did not complete"
                        );
                        return Ok(TopUpOutcome::Failed(snapshot));
                    }
                    TopUpStatus::Pending => {
                        if attempt >= self.settings.max_attempts {
                            return Err(self.fail_timed_out(reference_id, attempt));
                        }
                        debug!(
                            target: "topup_poller",
                            reference_id = %reference_id,
                            attempt,
                            "payment still pending"
                        );
                        self.set_phase(TopUpPhase::Waiting { attempt }, Some(reference_id));
                        tokio::time::sleep(self.settings.poll_interval).await;
                    }
                },
                Err(err) => {
                    // A failed check is retried like a PENDING result until
                    // the budget runs out.
                    if attempt >= self.settings.max_attempts {
                        return Err(self.fail_timed_out(reference_id, attempt));
                    }
                    warn!(
                        target: "topup_poller",
                        reference_id = %reference_id,
                        attempt,
                        error = %err,
                        "status check failed, will retry"
                    );
                    self.set_phase(TopUpPhase::Waiting { attempt }, Some(reference_id));
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
            }
        }
    }

    fn fail_timed_out(&self, reference_id: &str, attempts: u32) -> WalletApiError {
        self.active.store(false, Ordering::SeqCst);
        self.set_phase(
            TopUpPhase::Failed {
                reason: "confirmation window elapsed, check your transaction history".to_string(),
            },
            Some(reference_id),
        );
        warn!(
            target: "topup_poller",
            reference_id = %reference_id,
            attempts,
            "confirmation window elapsed"
        );
        WalletApiError::PollTimeout { attempts }
    }

    fn set_phase(&self, phase: TopUpPhase, reference_id: Option<&str>) {
        *self.phase.lock().expect("phase lock poisoned") = phase.clone();
        let update = PhaseUpdate {
            reference_id: reference_id.map(str::to_string),
            phase,
        };
        // Nobody listening is fine; the phase accessor stays current.
        let _ = self.updates.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    fn snapshot(status: TopUpStatus, reference_id: &str) -> TopUpStatusSnapshot {
        TopUpStatusSnapshot {
            status,
            amount: 100_000,
            reference_id: reference_id.to_string(),
            current_balance: 600_000,
            created_at: "2025-08-01T10:00:00Z".to_string(),
        }
    }

    /// Replays a fixed script of results, then repeats PENDING forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<TopUpStatus, ()>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<TopUpStatus, ()>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TopUpStatusSource for ScriptedSource {
        async fn fetch_status(
            &self,
            reference_id: &str,
        ) -> Result<TopUpStatusSnapshot, WalletApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(status)) => Ok(snapshot(status, reference_id)),
                Some(Err(())) => Err(WalletApiError::Transport("connection reset".to_string())),
                None => Ok(snapshot(TopUpStatus::Pending, reference_id)),
            }
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn fast_settings(max_attempts: u32) -> PollerSettings {
        PollerSettings {
            initial_delay: Duration::from_millis(1),
            poll_interval: Duration::from_millis(1),
            max_attempts,
            success_linger: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn completes_on_terminal_status() {
        init_tracing();
        let source = ScriptedSource::new(vec![Ok(TopUpStatus::Pending), Ok(TopUpStatus::Completed)]);
        let poller = TopUpPoller::new(source.clone(), fast_settings(36));

        assert!(poller.try_begin());
        let outcome = poller.run("REF-1").await.unwrap();

        match outcome {
            TopUpOutcome::Completed(snap) => assert_eq!(snap.current_balance, 600_000),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(source.calls(), 2);
        assert_eq!(poller.attempt_count(), 2);
        assert!(!poller.is_active());
        assert_eq!(poller.phase(), TopUpPhase::Idle);
    }

    #[tokio::test]
    async fn success_on_the_final_allowed_attempt() {
        let mut script: Vec<Result<TopUpStatus, ()>> = vec![Ok(TopUpStatus::Pending); 35];
        script.push(Ok(TopUpStatus::Completed));
        let source = ScriptedSource::new(script);
        let poller = TopUpPoller::new(source.clone(), fast_settings(36));

        assert!(poller.try_begin());
        let outcome = poller.run("REF-2").await.unwrap();

        assert!(matches!(outcome, TopUpOutcome::Completed(_)));
        assert_eq!(source.calls(), 36, "no extra status request after success");
        assert_eq!(poller.attempt_count(), 36);
    }

    #[tokio::test]
    async fn times_out_after_exactly_the_attempt_budget() {
        let source = ScriptedSource::new(vec![]); // endless PENDING
        let poller = TopUpPoller::new(source.clone(), fast_settings(36));

        assert!(poller.try_begin());
        let err = poller.run("REF-3").await.unwrap_err();

        match err {
            WalletApiError::PollTimeout { attempts } => assert_eq!(attempts, 36),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(source.calls(), 36, "no 37th request");
        assert!(matches!(poller.phase(), TopUpPhase::Failed { .. }));
    }

    #[tokio::test]
    async fn transport_errors_are_retried_like_pending() {
        let source = ScriptedSource::new(vec![Err(()), Err(()), Ok(TopUpStatus::Completed)]);
        let poller = TopUpPoller::new(source.clone(), fast_settings(36));

        assert!(poller.try_begin());
        let outcome = poller.run("REF-4").await.unwrap();

        assert!(matches!(outcome, TopUpOutcome::Completed(_)));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn error_on_final_attempt_times_out() {
        let source = ScriptedSource::new(vec![Err(()), Err(()), Err(()), Err(())]);
        let poller = TopUpPoller::new(source.clone(), fast_settings(4));

        assert!(poller.try_begin());
        let err = poller.run("REF-5").await.unwrap_err();

        assert!(matches!(err, WalletApiError::PollTimeout { attempts: 4 }));
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn gateway_failure_is_terminal() {
        let source = ScriptedSource::new(vec![Ok(TopUpStatus::Pending), Ok(TopUpStatus::Failed)]);
        let poller = TopUpPoller::new(source.clone(), fast_settings(36));

        assert!(poller.try_begin());
        let outcome = poller.run("REF-6").await.unwrap();

        match outcome {
            TopUpOutcome::Failed(snap) => assert_eq!(snap.status, TopUpStatus::Failed),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(source.calls(), 2);
        assert!(matches!(poller.phase(), TopUpPhase::Failed { .. }));
    }

    #[tokio::test]
    async fn gateway_cancellation_is_terminal() {
        let source = ScriptedSource::new(vec![Ok(TopUpStatus::Cancelled)]);
        let poller = TopUpPoller::new(source.clone(), fast_settings(36));

        assert!(poller.try_begin());
        let outcome = poller.run("REF-7").await.unwrap();

        assert!(matches!(outcome, TopUpOutcome::Failed(_)));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn user_cancellation_stops_scheduling() {
        init_tracing();
        let source = ScriptedSource::new(vec![]); // endless PENDING
        let settings = PollerSettings {
            initial_delay: Duration::from_millis(1),
            poll_interval: Duration::from_millis(20),
            max_attempts: 36,
            success_linger: Duration::from_millis(1),
        };
        let poller = Arc::new(TopUpPoller::new(source.clone(), settings));

        assert!(poller.try_begin());
        let runner = {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.run("REF-8").await })
        };

        // Let a few attempts land, then cancel mid-wait.
        tokio::time::sleep(Duration::from_millis(70)).await;
        poller.cancel();
        let outcome = runner.await.unwrap().unwrap();

        let calls_at_cancel = source.calls();
        assert!(calls_at_cancel >= 1);
        match outcome {
            TopUpOutcome::Cancelled { attempts } => assert_eq!(attempts, calls_at_cancel),
            other => panic!("unexpected outcome: {other:?}"),
        }

        // Even though a timer was pending, nothing polls afterwards.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), calls_at_cancel);
        assert_eq!(poller.phase(), TopUpPhase::Idle);
        assert!(!poller.is_active());
    }

    #[tokio::test]
    async fn only_one_session_at_a_time() {
        let source = ScriptedSource::new(vec![Ok(TopUpStatus::Completed)]);
        let poller = TopUpPoller::new(source, fast_settings(36));

        assert!(poller.try_begin());
        assert!(!poller.try_begin(), "second claim must be refused");

        poller.reset();
        assert!(poller.try_begin(), "claim succeeds again after reset");
    }

    #[tokio::test]
    async fn consecutive_pendings_only_move_the_attempt_counter() {
        let source = ScriptedSource::new(vec![
            Ok(TopUpStatus::Pending),
            Ok(TopUpStatus::Pending),
            Ok(TopUpStatus::Completed),
        ]);
        let poller = TopUpPoller::new(source, fast_settings(36));
        let mut rx = poller.subscribe();

        assert!(poller.try_begin());
        poller.run("REF-9").await.unwrap();

        let mut phases = Vec::new();
        while let Ok(update) = rx.try_recv() {
            phases.push(update.phase);
        }
        assert_eq!(
            phases,
            vec![
                TopUpPhase::Processing,
                TopUpPhase::Waiting { attempt: 0 },
                TopUpPhase::Waiting { attempt: 1 },
                TopUpPhase::Waiting { attempt: 2 },
                TopUpPhase::Success {
                    current_balance: 600_000
                },
                TopUpPhase::Idle,
            ]
        );
    }

    #[tokio::test]
    async fn run_without_claim_is_refused() {
        let source = ScriptedSource::new(vec![]);
        let poller = TopUpPoller::new(source.clone(), fast_settings(36));

        let err = poller.run("REF-10").await.unwrap_err();
        assert!(matches!(err, WalletApiError::Validation { .. }));
        assert_eq!(source.calls(), 0);
    }
}
