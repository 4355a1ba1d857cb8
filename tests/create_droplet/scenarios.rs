//! BDD scenarios for the droplet creation step.

use rstest_bdd_macros::scenario;

use super::test_helpers::{DropletContext, droplet_context};

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Create a droplet without recovery mode"
)]
fn scenario_create_without_recovery(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Install the preset SSH key before the configured one"
)]
fn scenario_preset_ssh_key_first(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Drive the droplet through recovery mode"
)]
fn scenario_recovery_chain(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Wait for the droplet lock to clear before each action"
)]
fn scenario_wait_for_unlock(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Tolerate transient fetch failures while waiting"
)]
fn scenario_transient_fetch_failures(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Stop the recovery chain when power-off is rejected"
)]
fn scenario_power_off_rejected(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Stop the recovery chain when the droplet never powers off"
)]
fn scenario_power_off_stalls(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Skip cleanup when creation fails"
)]
fn scenario_create_fails(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Halt before any remote call when user data cannot be read"
)]
fn scenario_unreadable_user_data(droplet_context: DropletContext) {
    let _ = droplet_context;
}

#[scenario(
    path = "tests/features/create_droplet.feature",
    name = "Report cleanup failures without escalating them"
)]
fn scenario_cleanup_failure_reported(droplet_context: DropletContext) {
    let _ = droplet_context;
}
