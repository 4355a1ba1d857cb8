//! Shared fixtures for droplet creation scenarios.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use drydock::test_support::{RecordingUi, ScriptedClient, Verb};
use drydock::{DropletConfig, InstanceId, SshKeyId, WorkflowError};
use rstest::fixture;

use crate::droplet_config::droplet_config;

/// Poll interval used by every scenario.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Budget for each state wait; generous next to the poll interval.
pub const STATE_TIMEOUT: Duration = Duration::from_millis(250);

/// What the workflow left behind once it finished.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub result: Result<(), WorkflowError>,
    pub droplet_id: Option<InstanceId>,
    pub instance_id: Option<InstanceId>,
}

#[derive(Clone, Debug)]
pub struct DropletContext {
    pub client: ScriptedClient,
    pub ui: RecordingUi,
    config: Arc<Mutex<DropletConfig>>,
    preset_key: Arc<Mutex<Option<SshKeyId>>>,
    outcome: Arc<Mutex<Option<RunOutcome>>>,
}

impl DropletContext {
    pub fn config(&self) -> MutexGuard<'_, DropletConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn preset_key(&self) -> Option<SshKeyId> {
        *self.preset_key.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_preset_key(&self, id: SshKeyId) {
        *self.preset_key.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn record_outcome(&self, outcome: RunOutcome) {
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
    }
}

#[fixture]
pub fn droplet_context() -> DropletContext {
    DropletContext {
        client: ScriptedClient::new(),
        ui: RecordingUi::new(),
        config: Arc::new(Mutex::new(droplet_config("drydock-bdd"))),
        preset_key: Arc::new(Mutex::new(None)),
        outcome: Arc::new(Mutex::new(None)),
    }
}

/// Maps the verb names used in feature files onto client verbs.
pub fn parse_verb(name: &str) -> Option<Verb> {
    let verb = match name.trim() {
        "create" => Verb::Create,
        "delete" => Verb::Delete,
        "power_on" => Verb::PowerOn,
        "power_off" => Verb::PowerOff,
        "enable_recovery" => Verb::EnableRecovery,
        "fetch" => Verb::Fetch,
        "delete_image" => Verb::DeleteImage,
        _ => return None,
    };
    Some(verb)
}
