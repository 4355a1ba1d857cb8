//! Polling until a droplet reaches an expected state.
//!
//! Every provider action is asynchronous: the API accepts the request and the
//! droplet changes state some time later. [`poll_until`] re-fetches the state
//! until a predicate holds, the budget runs out, or the workflow is
//! cancelled. Fetch failures inside the budget are treated as transient.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::{InstanceClient, InstanceId, InstanceState};

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Lifecycle label of a running droplet.
pub const STATUS_ACTIVE: &str = "active";
/// Lifecycle label of a powered-off droplet.
pub const STATUS_OFF: &str = "off";

/// Errors raised while waiting.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum WaitError {
    /// Raised when the condition did not hold within the budget.
    #[error("timeout after {elapsed:?} waiting for droplet {instance_id} to {condition}")]
    Timeout {
        /// Droplet being polled.
        instance_id: InstanceId,
        /// Condition being awaited.
        condition: String,
        /// Time spent before giving up.
        elapsed: Duration,
    },
    /// Raised when the workflow was cancelled mid-wait.
    #[error("cancelled while waiting for droplet {instance_id} to {condition}")]
    Cancelled {
        /// Droplet being polled.
        instance_id: InstanceId,
        /// Condition being awaited.
        condition: String,
    },
}

/// Interval and budget for a single wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// Delay between polls.
    pub interval: Duration,
    /// Total budget for the wait.
    pub timeout: Duration,
}

impl PollPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Conditions the provisioning workflow waits for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitCondition {
    /// Lifecycle status equals the label.
    Status(&'static str),
    /// No provider action is in flight.
    Unlocked,
    /// The droplet reports recovery mode.
    RecoveryActive,
}

impl WaitCondition {
    /// Returns true when `state` satisfies the condition.
    #[must_use]
    pub fn is_met(self, state: &InstanceState) -> bool {
        match self {
            Self::Status(label) => state.status.as_str() == label,
            Self::Unlocked => !state.locked,
            Self::RecoveryActive => state.recovery_mode,
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(label) => write!(f, "become {label}"),
            Self::Unlocked => f.write_str("become unlocked"),
            Self::RecoveryActive => f.write_str("enter recovery mode"),
        }
    }
}

/// Polls `fetch` until `predicate` accepts a state.
///
/// The first accepted state is returned immediately; no further fetch is
/// made. Fetch errors and fetches that outlive the remaining budget count as
/// "not yet". Cancellation is observed before every attempt and while
/// fetching or sleeping.
///
/// # Errors
///
/// Returns [`WaitError::Timeout`] once `policy.timeout` elapses without the
/// predicate holding, or [`WaitError::Cancelled`] when `cancel` fires.
pub async fn poll_until<T, E, F, Fut, P>(
    instance_id: InstanceId,
    condition: &str,
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut fetch: F,
    predicate: P,
) -> Result<T, WaitError>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let started = Instant::now();
    let cancelled = || WaitError::Cancelled {
        instance_id,
        condition: condition.to_owned(),
    };
    let mut attempts = 0_u32;

    loop {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        attempts = attempts.saturating_add(1);

        let remaining = policy.timeout.saturating_sub(started.elapsed());
        let outcome = tokio::select! {
            outcome = timeout(remaining, fetch()) => outcome,
            () = cancel.cancelled() => return Err(cancelled()),
        };

        match outcome {
            Ok(Ok(value)) if predicate(&value) => {
                debug!(%instance_id, condition, attempts, "condition met");
                return Ok(value);
            }
            Ok(Ok(_)) => debug!(%instance_id, condition, attempts, "condition not met yet"),
            Ok(Err(err)) => {
                debug!(%instance_id, condition, attempts, error = %err, "fetch failed, retrying");
            }
            Err(_) => debug!(%instance_id, condition, attempts, "fetch outlived the budget"),
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            return Err(WaitError::Timeout {
                instance_id,
                condition: condition.to_owned(),
                elapsed,
            });
        }

        let pause = policy.interval.min(policy.timeout.saturating_sub(elapsed));
        tokio::select! {
            () = sleep(pause) => {}
            () = cancel.cancelled() => return Err(cancelled()),
        }
    }
}

/// Waits on droplet state through an [`InstanceClient`].
#[derive(Debug)]
pub struct StateWaiter<'a, C> {
    client: &'a C,
    policy: PollPolicy,
    cancel: &'a CancellationToken,
}

impl<'a, C: InstanceClient> StateWaiter<'a, C> {
    /// Creates a waiter sharing one policy across every wait it performs.
    #[must_use]
    pub const fn new(client: &'a C, policy: PollPolicy, cancel: &'a CancellationToken) -> Self {
        Self {
            client,
            policy,
            cancel,
        }
    }

    /// Waits until `condition` holds for droplet `id`. Each call gets the
    /// full budget.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError`] on timeout or cancellation.
    pub async fn wait_for(
        &self,
        id: InstanceId,
        condition: WaitCondition,
    ) -> Result<InstanceState, WaitError> {
        let label = condition.to_string();
        poll_until(
            id,
            &label,
            self.policy,
            self.cancel,
            || self.client.fetch(id),
            |state| condition.is_met(state),
        )
        .await
    }
}
