//! Core library for the drydock image builder.
//!
//! The crate provisions a build droplet through a linear workflow of steps,
//! polls the provider until each asynchronous transition lands, and tears
//! the droplet down again when any step fails. A finished build is described
//! by an [`Artifact`].

pub mod artifact;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod request;
pub mod step;
pub mod steps;
pub mod test_support;
pub mod ui;
pub mod user_data;
pub mod wait;

pub use artifact::{Artifact, BUILDER_ID};
pub use client::{
    ClientFuture, ImageId, InstanceClient, InstanceId, InstanceState, InstanceStatus, SshKeyId,
};
pub use config::{ConfigError, DropletConfig};
pub use context::WorkflowContext;
pub use error::{PhaseError, RecoveryPhase, WorkflowError};
pub use request::{CreationRequest, ImageRef};
pub use step::{Step, StepAction, StepFuture, Workflow};
pub use steps::CreateDropletStep;
pub use ui::{ConsoleUi, Ui};
pub use user_data::{UserDataError, resolve_user_data};
pub use wait::{PollPolicy, StateWaiter, WaitCondition, WaitError, poll_until};
