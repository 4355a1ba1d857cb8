//! Typed state threaded through every step of a workflow.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::client::{InstanceClient, InstanceId, SshKeyId};
use crate::config::DropletConfig;
use crate::error::WorkflowError;
use crate::step::StepAction;
use crate::ui::Ui;

/// State shared by the steps of one workflow execution.
///
/// Each execution owns its context; only the client handle may be shared
/// with other executions.
pub struct WorkflowContext<C> {
    client: Arc<C>,
    ui: Arc<dyn Ui>,
    config: Arc<DropletConfig>,
    cancel: CancellationToken,
    ssh_key_id: Option<SshKeyId>,
    droplet_id: Option<InstanceId>,
    instance_id: Option<InstanceId>,
    error: Option<WorkflowError>,
    generated: BTreeMap<String, Value>,
}

impl<C: InstanceClient> WorkflowContext<C> {
    /// Creates a context with a fresh cancellation token.
    pub fn new(client: Arc<C>, ui: Arc<dyn Ui>, config: Arc<DropletConfig>) -> Self {
        Self {
            client,
            ui,
            config,
            cancel: CancellationToken::new(),
            ssh_key_id: None,
            droplet_id: None,
            instance_id: None,
            error: None,
            generated: BTreeMap::new(),
        }
    }

    /// Replaces the cancellation token, typically with a child of a
    /// process-wide token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Shared client handle.
    #[must_use]
    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// Output sink.
    #[must_use]
    pub fn ui(&self) -> Arc<dyn Ui> {
        Arc::clone(&self.ui)
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> Arc<DropletConfig> {
        Arc::clone(&self.config)
    }

    /// Token that aborts in-flight waits.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// SSH key created or chosen by an earlier stage, if any.
    #[must_use]
    pub const fn ssh_key_id(&self) -> Option<SshKeyId> {
        self.ssh_key_id
    }

    /// Records the SSH key produced by an earlier stage.
    pub const fn set_ssh_key_id(&mut self, id: SshKeyId) {
        self.ssh_key_id = Some(id);
    }

    /// Droplet created by the creation step.
    #[must_use]
    pub const fn droplet_id(&self) -> Option<InstanceId> {
        self.droplet_id
    }

    /// Instance created by whichever step provisions it. Later stages read
    /// this without knowing which step set it.
    #[must_use]
    pub const fn instance_id(&self) -> Option<InstanceId> {
        self.instance_id
    }

    /// Publishes a freshly created droplet under both identifiers.
    pub const fn record_instance(&mut self, id: InstanceId) {
        self.droplet_id = Some(id);
        self.instance_id = Some(id);
    }

    /// Error recorded by the halting step.
    #[must_use]
    pub const fn error(&self) -> Option<&WorkflowError> {
        self.error.as_ref()
    }

    /// Records `err`, reports it to the operator, and asks the runner to
    /// halt.
    pub fn halt(&mut self, err: WorkflowError) -> StepAction {
        let message = err.to_string();
        error!(error = %message, "workflow step failed");
        self.ui.error(&message);
        self.error = Some(err);
        StepAction::Halt
    }

    /// Values later stages and artifacts consume.
    #[must_use]
    pub const fn generated_data(&self) -> &BTreeMap<String, Value> {
        &self.generated
    }

    /// Stores a value for later stages.
    pub fn insert_generated(&mut self, key: impl Into<String>, value: Value) {
        self.generated.insert(key.into(), value);
    }
}
