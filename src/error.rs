//! Errors recorded when a workflow halts.

use std::fmt;

use thiserror::Error;

use crate::user_data::UserDataError;
use crate::wait::WaitError;

/// Phase of the recovery-mode transition chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecoveryPhase {
    /// Initial boot to `active`.
    Boot,
    /// Power-off to `off`.
    PowerOff,
    /// Switch to the recovery boot mode.
    EnableRecovery,
    /// Power-on back to `active`.
    PowerOn,
}

impl fmt::Display for RecoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Boot => "waiting for droplet to become active",
            Self::PowerOff => "powering off droplet",
            Self::EnableRecovery => "switching droplet to recovery mode",
            Self::PowerOn => "powering on droplet",
        })
    }
}

/// Failure inside one recovery phase.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PhaseError {
    /// The provider rejected the action request.
    #[error("{action} request failed: {message}")]
    Action {
        /// Action verb that was issued.
        action: &'static str,
        /// Message returned by the client.
        message: String,
    },
    /// The droplet did not reach the awaited state.
    #[error(transparent)]
    Wait(#[from] WaitError),
}

/// Error recorded in the workflow context when a step halts.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum WorkflowError {
    /// The creation request could not be assembled.
    #[error(transparent)]
    UserData(#[from] UserDataError),
    /// The create call failed.
    #[error("error creating droplet: {message}")]
    Create {
        /// Message returned by the client.
        message: String,
    },
    /// A recovery-mode transition failed.
    #[error("error {phase}: {source}")]
    Recovery {
        /// Phase that failed.
        phase: RecoveryPhase,
        /// Underlying failure.
        #[source]
        source: PhaseError,
    },
    /// The workflow was cancelled before a step started.
    #[error("workflow cancelled before step {step}")]
    Cancelled {
        /// Step that was about to run.
        step: &'static str,
    },
    /// A step halted without recording why.
    #[error("step {step} halted without reporting an error")]
    Halted {
        /// Step that halted.
        step: &'static str,
    },
}
