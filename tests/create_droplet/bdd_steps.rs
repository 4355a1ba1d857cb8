//! BDD step definitions for the droplet creation step.

use std::sync::Arc;

use drydock::test_support::{ClientCall, ScriptedClient, Verb};
use drydock::{CreateDropletStep, DropletConfig, SshKeyId, Step, Workflow, WorkflowContext};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{DropletContext, POLL_INTERVAL, RunOutcome, STATE_TIMEOUT, parse_verb};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("unknown client verb '{0}'")]
    UnknownVerb(String),
    #[error("failed to start runtime: {0}")]
    Runtime(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn verb(name: &str) -> Result<Verb, StepError> {
    parse_verb(name).ok_or_else(|| StepError::UnknownVerb(name.to_owned()))
}

fn outcome(droplet_context: &DropletContext) -> Result<RunOutcome, StepError> {
    droplet_context
        .outcome()
        .ok_or_else(|| StepError::Assertion(String::from("missing outcome")))
}

#[given("a droplet build configuration")]
fn build_configuration(droplet_context: &DropletContext) {
    let _ = droplet_context;
}

#[given("recovery mode is enabled")]
fn recovery_enabled(droplet_context: &DropletContext) {
    droplet_context.config().recovery_mode = true;
}

#[given("the configured ssh key id is \"{id}\"")]
fn configured_ssh_key(droplet_context: &DropletContext, id: u64) {
    droplet_context.config().ssh_key_id = id;
}

#[given("an earlier stage supplied ssh key id \"{id}\"")]
fn preset_ssh_key(droplet_context: &DropletContext, id: u64) {
    droplet_context.set_preset_key(SshKeyId::new(id));
}

#[given("the user data file is \"{path}\"")]
fn user_data_file(droplet_context: &DropletContext, path: String) {
    droplet_context.config().user_data_file = Some(path);
}

#[given("the client rejects \"{name}\"")]
fn client_rejects(droplet_context: &DropletContext, name: String) -> Result<(), StepError> {
    droplet_context.client.fail(verb(&name)?);
    Ok(())
}

#[given("the client accepts \"{name}\" without acting on it")]
fn client_stalls(droplet_context: &DropletContext, name: String) -> Result<(), StepError> {
    droplet_context.client.stall(verb(&name)?);
    Ok(())
}

#[given("the next \"{count}\" state fetches fail")]
fn fetches_fail(droplet_context: &DropletContext, count: u32) {
    droplet_context.client.fail_next_fetches(count);
}

#[given("the droplet stays locked for the first \"{count}\" state fetches")]
fn droplet_locked(droplet_context: &DropletContext, count: u32) {
    droplet_context.client.lock_for_fetches(count);
}

#[given("every action holds the droplet lock for \"{count}\" state fetches")]
fn actions_hold_lock(droplet_context: &DropletContext, count: u32) {
    droplet_context.client.hold_locks_for(count);
}

#[when("the workflow runs")]
fn workflow_runs(droplet_context: &DropletContext) -> Result<(), StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Runtime(err.to_string()))?;
    let config: DropletConfig = droplet_context.config().clone();
    let mut ctx = WorkflowContext::new(
        Arc::new(droplet_context.client.clone()),
        Arc::new(droplet_context.ui.clone()),
        Arc::new(config),
    );
    if let Some(id) = droplet_context.preset_key() {
        ctx.set_ssh_key_id(id);
    }
    let step = CreateDropletStep::new()
        .with_poll_interval(POLL_INTERVAL)
        .with_state_timeout(STATE_TIMEOUT);
    let steps: Vec<Box<dyn Step<ScriptedClient>>> = vec![Box::new(step)];
    let mut workflow = Workflow::new(steps);

    let result = runtime.block_on(workflow.run(&mut ctx));
    droplet_context.record_outcome(RunOutcome {
        result,
        droplet_id: ctx.droplet_id(),
        instance_id: ctx.instance_id(),
    });
    Ok(())
}

#[then("the workflow succeeds")]
fn workflow_succeeds(droplet_context: &DropletContext) -> Result<(), StepError> {
    match outcome(droplet_context)?.result {
        Ok(()) => Ok(()),
        Err(err) => Err(StepError::Assertion(format!(
            "workflow failed unexpectedly: {err}"
        ))),
    }
}

#[then("the workflow error mentions \"{text}\"")]
fn workflow_error_mentions(droplet_context: &DropletContext, text: String) -> Result<(), StepError> {
    match outcome(droplet_context)?.result {
        Err(err) if err.to_string().contains(&text) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected an error mentioning '{text}', got {other:?}"
        ))),
    }
}

#[then("the droplet id is published to later stages")]
fn droplet_id_published(droplet_context: &DropletContext) -> Result<(), StepError> {
    let run = outcome(droplet_context)?;
    let created = droplet_context.client.calls().iter().any(|call| {
        matches!(call, ClientCall::Create(name) if name == "drydock-bdd")
    });
    match (run.droplet_id, run.instance_id) {
        (Some(droplet), Some(instance)) if created && droplet == instance => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected matching droplet and instance ids, got {other:?}"
        ))),
    }
}

#[then("no droplet is published to later stages")]
fn no_droplet_published(droplet_context: &DropletContext) -> Result<(), StepError> {
    let run = outcome(droplet_context)?;
    if run.droplet_id.is_none() && run.instance_id.is_none() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no published ids, got {:?} / {:?}",
            run.droplet_id, run.instance_id
        )))
    }
}

#[then("the client actions are \"{expected}\"")]
fn client_actions(droplet_context: &DropletContext, expected: String) -> Result<(), StepError> {
    let actual = droplet_context
        .client
        .actions()
        .iter()
        .map(|call| call.verb().to_string())
        .collect::<Vec<_>>()
        .join(",");
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected actions {expected}, got {actual}"
        )))
    }
}

#[then("the create request lists ssh keys \"{expected}\"")]
fn create_request_keys(droplet_context: &DropletContext, expected: String) -> Result<(), StepError> {
    let request = droplet_context
        .client
        .last_request()
        .ok_or_else(|| StepError::Assertion(String::from("no create request")))?;
    let actual = request
        .ssh_keys
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected ssh keys {expected}, got {actual}"
        )))
    }
}

#[then("the droplet reports status \"{status}\"")]
fn droplet_status(droplet_context: &DropletContext, status: String) -> Result<(), StepError> {
    match droplet_context.client.droplet_status() {
        Some(actual) if actual == status => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected status {status}, got {other:?}"
        ))),
    }
}

#[then("recovery mode is never requested")]
fn recovery_never_requested(droplet_context: &DropletContext) -> Result<(), StepError> {
    match droplet_context.client.count(Verb::EnableRecovery) {
        0 => Ok(()),
        n => Err(StepError::Assertion(format!(
            "expected no enable_recovery calls, got {n}"
        ))),
    }
}

#[then("the droplet is deleted exactly once")]
fn deleted_once(droplet_context: &DropletContext) -> Result<(), StepError> {
    match droplet_context.client.count(Verb::Delete) {
        1 => Ok(()),
        n => Err(StepError::Assertion(format!(
            "expected one delete call, got {n}"
        ))),
    }
}

#[then("the client received no calls")]
fn no_client_calls(droplet_context: &DropletContext) -> Result<(), StepError> {
    let calls = droplet_context.client.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no client calls, got {calls:?}"
        )))
    }
}

#[then("the operator is asked to destroy the droplet manually")]
fn manual_cleanup_requested(droplet_context: &DropletContext) -> Result<(), StepError> {
    let errors = droplet_context.ui.errors();
    if errors
        .iter()
        .any(|line| line.contains("Please destroy it manually"))
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected a manual cleanup notice, got {errors:?}"
        )))
    }
}

#[then("no action was sent to a locked droplet")]
fn no_locked_actions(droplet_context: &DropletContext) -> Result<(), StepError> {
    let rejected = droplet_context.client.rejected_while_locked();
    if rejected.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "actions reached a locked droplet: {rejected:?}"
        )))
    }
}
