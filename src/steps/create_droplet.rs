//! Droplet creation, with an optional reboot into recovery mode.
//!
//! The provider locks a droplet for the duration of every action and rejects
//! new actions while the lock is held, so each transition of the recovery
//! chain is followed by a wait for the lock to clear.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{InstanceClient, InstanceId};
use crate::context::WorkflowContext;
use crate::error::{PhaseError, RecoveryPhase, WorkflowError};
use crate::request::CreationRequest;
use crate::step::{Step, StepAction, StepFuture};
use crate::ui::Ui;
use crate::wait::{
    DEFAULT_POLL_INTERVAL, PollPolicy, STATUS_ACTIVE, STATUS_OFF, StateWaiter, WaitCondition,
};

const RECOVERY_CHAIN: [RecoveryPhase; 4] = [
    RecoveryPhase::Boot,
    RecoveryPhase::PowerOff,
    RecoveryPhase::EnableRecovery,
    RecoveryPhase::PowerOn,
];

impl RecoveryPhase {
    const fn target(self) -> WaitCondition {
        match self {
            Self::Boot | Self::PowerOn => WaitCondition::Status(STATUS_ACTIVE),
            Self::PowerOff => WaitCondition::Status(STATUS_OFF),
            Self::EnableRecovery => WaitCondition::RecoveryActive,
        }
    }

    const fn progress(self) -> &'static str {
        match self {
            Self::Boot => "Waiting for droplet to become active...",
            Self::PowerOff => "Shutting down droplet...",
            Self::EnableRecovery => "Switching droplet to recovery mode...",
            Self::PowerOn => "Starting droplet...",
        }
    }
}

/// Creates the build droplet and deletes it again on cleanup.
#[derive(Debug)]
pub struct CreateDropletStep {
    droplet_id: Option<InstanceId>,
    poll_interval: Duration,
    state_timeout: Option<Duration>,
}

impl Default for CreateDropletStep {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateDropletStep {
    /// Creates a step that has not provisioned anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            droplet_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state_timeout: None,
        }
    }

    /// Overrides the delay between state polls.
    ///
    /// This is primarily used by tests to keep wait scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the configured budget for each state wait.
    ///
    /// This is primarily used by tests that need sub-second timeouts.
    #[must_use]
    pub const fn with_state_timeout(mut self, timeout: Duration) -> Self {
        self.state_timeout = Some(timeout);
        self
    }

    /// Droplet created by this step and not yet cleaned up.
    #[must_use]
    pub const fn droplet_id(&self) -> Option<InstanceId> {
        self.droplet_id
    }

    async fn create<C: InstanceClient>(&mut self, ctx: &mut WorkflowContext<C>) -> StepAction {
        let ui = ctx.ui();
        let config = ctx.config();
        ui.say("Creating droplet...");

        let request = match CreationRequest::from_config(&config, ctx.ssh_key_id()) {
            Ok(request) => request,
            Err(err) => return ctx.halt(err.into()),
        };
        debug!(request = ?request, "droplet create parameters");

        let client = ctx.client();
        let id = match client.create(&request).await {
            Ok(id) => id,
            Err(err) => {
                return ctx.halt(WorkflowError::Create {
                    message: err.to_string(),
                });
            }
        };
        info!(droplet_id = %id, name = %request.name, "droplet created");

        self.droplet_id = Some(id);
        ctx.record_instance(id);
        ctx.insert_generated("droplet_name", Value::String(request.name));

        if !config.recovery_mode {
            return StepAction::Continue;
        }

        ui.say("Enabling recovery mode...");
        let timeout = self.state_timeout.unwrap_or_else(|| config.state_timeout());
        let policy = PollPolicy::new(self.poll_interval, timeout);
        let outcome = {
            let waiter = StateWaiter::new(client.as_ref(), policy, ctx.cancellation());
            enter_recovery_mode(client.as_ref(), &waiter, ui.as_ref(), id).await
        };
        match outcome {
            Ok(()) => StepAction::Continue,
            Err(err) => ctx.halt(err),
        }
    }

    async fn destroy<C: InstanceClient>(&mut self, ctx: &WorkflowContext<C>) {
        let Some(id) = self.droplet_id else {
            return;
        };

        let ui = ctx.ui();
        ui.say("Destroying droplet...");
        match ctx.client().delete(id).await {
            Ok(()) => {
                info!(droplet_id = %id, "droplet destroyed");
                self.droplet_id = None;
            }
            Err(err) => {
                warn!(droplet_id = %id, error = %err, "droplet cleanup failed");
                ui.error(&format!(
                    "Error destroying droplet. Please destroy it manually: {err}"
                ));
            }
        }
    }
}

/// Drives the droplet through every recovery phase. The first failure ends
/// the chain and leaves the droplet wherever it got to.
async fn enter_recovery_mode<C: InstanceClient>(
    client: &C,
    waiter: &StateWaiter<'_, C>,
    ui: &dyn Ui,
    id: InstanceId,
) -> Result<(), WorkflowError> {
    for phase in RECOVERY_CHAIN {
        ui.say(phase.progress());
        run_phase(client, waiter, id, phase)
            .await
            .map_err(|source| WorkflowError::Recovery { phase, source })?;
        debug!(droplet_id = %id, ?phase, "recovery phase complete");
    }
    Ok(())
}

async fn run_phase<C: InstanceClient>(
    client: &C,
    waiter: &StateWaiter<'_, C>,
    id: InstanceId,
    phase: RecoveryPhase,
) -> Result<(), PhaseError> {
    let issued = match phase {
        RecoveryPhase::Boot => None,
        RecoveryPhase::PowerOff => Some(("power_off", client.power_off(id).await)),
        RecoveryPhase::EnableRecovery => {
            Some(("enable_recovery", client.enable_recovery(id, true).await))
        }
        RecoveryPhase::PowerOn => Some(("power_on", client.power_on(id).await)),
    };
    if let Some((action, Err(err))) = issued {
        return Err(PhaseError::Action {
            action,
            message: err.to_string(),
        });
    }

    waiter.wait_for(id, phase.target()).await?;
    waiter.wait_for(id, WaitCondition::Unlocked).await?;
    Ok(())
}

impl<C: InstanceClient> Step<C> for CreateDropletStep {
    fn name(&self) -> &'static str {
        "create_droplet"
    }

    fn run<'a>(&'a mut self, ctx: &'a mut WorkflowContext<C>) -> StepFuture<'a, StepAction> {
        Box::pin(self.create(ctx))
    }

    fn cleanup<'a>(&'a mut self, ctx: &'a mut WorkflowContext<C>) -> StepFuture<'a, ()> {
        Box::pin(self.destroy(ctx))
    }
}
