//! Refresh outcomes and the single-flight guard around refresh calls

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokenward_core::AuthSnapshot;
use tokio::sync::Mutex;

/// Result of one refresh round
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new token was issued and stored
    Refreshed(AuthSnapshot),
    /// The refresh endpoint answered with an error status; the persisted
    /// credential has been removed
    Rejected { status: u16, message: String },
    /// No usable answer (network failure, undecodable body or token); the
    /// previous token is kept and flagged stale
    Stale { reason: String },
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed(_))
    }

    /// Token issued by this round, if any
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Refreshed(snapshot) => Some(&snapshot.token),
            Self::Rejected { .. } | Self::Stale { .. } => None,
        }
    }
}

#[derive(Default)]
struct Round {
    completed: u64,
    last: Option<RefreshOutcome>,
}

/// At most one refresh runs at a time. Callers that arrive while a round is
/// running wait for it and get its outcome instead of starting their own.
#[derive(Default)]
pub(crate) struct RefreshGate {
    completed: AtomicU64,
    round: Mutex<Round>,
}

impl RefreshGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn run<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        // Read before queueing on the lock: a change afterwards means a round
        // finished while this caller was waiting.
        let seen = self.completed.load(Ordering::Acquire);
        let mut round = self.round.lock().await;

        if round.completed != seen {
            if let Some(outcome) = &round.last {
                tracing::debug!(round = round.completed, "joining finished refresh round");
                return outcome.clone();
            }
        }

        let outcome = refresh().await;
        round.completed += 1;
        round.last = Some(outcome.clone());
        self.completed.store(round.completed, Ordering::Release);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn stale(reason: &str) -> RefreshOutcome {
        RefreshOutcome::Stale {
            reason: reason.to_string(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_round() {
        let gate = RefreshGate::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let refresh = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            stale(&format!("call {n}"))
        };

        let (a, b, c) = tokio::join!(gate.run(refresh), gate.run(refresh), gate.run(refresh));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, stale("call 0"));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[tokio::test]
    async fn test_sequential_callers_each_refresh() {
        let gate = RefreshGate::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for expected in 1..=3 {
            let outcome = gate
                .run(move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    stale("offline")
                })
                .await;
            assert_eq!(outcome, stale("offline"));
            assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
    }

    #[test]
    fn test_outcome_token() {
        let snapshot = AuthSnapshot {
            token: "abc".to_string(),
            ..AuthSnapshot::default()
        };
        assert_eq!(RefreshOutcome::Refreshed(snapshot).token(), Some("abc"));
        assert_eq!(stale("x").token(), None);
        assert!(
            !RefreshOutcome::Rejected {
                status: 401,
                message: String::new()
            }
            .is_refreshed()
        );
    }
}
