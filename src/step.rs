//! Step contract and the linear runner that drives it.
//!
//! A workflow is an ordered list of steps. Each step runs once; the first
//! step to halt stops the sequence, and every step that already ran
//! (including the halting one) is cleaned up in reverse order.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info};

use crate::client::InstanceClient;
use crate::context::WorkflowContext;
use crate::error::WorkflowError;

/// Future returned by step operations.
pub type StepFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What the runner should do after a step ran.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepAction {
    /// Proceed to the next step.
    Continue,
    /// Stop and clean up. The step has recorded an error in the context.
    Halt,
}

/// Unit of orchestration.
pub trait Step<C: InstanceClient>: Send {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Performs the forward action. Failures are recorded through
    /// [`WorkflowContext::halt`], never propagated.
    fn run<'a>(&'a mut self, ctx: &'a mut WorkflowContext<C>) -> StepFuture<'a, StepAction>;

    /// Undoes whatever side effect `run` completed. Must be a no-op when
    /// `run` never got that far, and must not fail loudly.
    fn cleanup<'a>(&'a mut self, ctx: &'a mut WorkflowContext<C>) -> StepFuture<'a, ()>;
}

/// Runs steps in order with reverse-order cleanup on halt.
pub struct Workflow<C> {
    steps: Vec<Box<dyn Step<C>>>,
}

impl<C: InstanceClient> Workflow<C> {
    /// Creates a workflow from an ordered list of steps.
    #[must_use]
    pub fn new(steps: Vec<Box<dyn Step<C>>>) -> Self {
        Self { steps }
    }

    /// Runs every step once.
    ///
    /// # Errors
    ///
    /// Returns the error recorded by the halting step after cleanup has run,
    /// [`WorkflowError::Cancelled`] when cancellation is observed between
    /// steps, or [`WorkflowError::Halted`] when a step halts without
    /// recording an error.
    pub async fn run(&mut self, ctx: &mut WorkflowContext<C>) -> Result<(), WorkflowError> {
        let mut ran = 0;
        let mut halted_at = None;

        for step in &mut self.steps {
            let name = step.name();
            if ctx.cancellation().is_cancelled() {
                ctx.halt(WorkflowError::Cancelled { step: name });
                halted_at = Some(name);
                break;
            }

            info!(step = name, "running step");
            ran += 1;
            if step.run(ctx).await == StepAction::Halt {
                halted_at = Some(name);
                break;
            }
        }

        let Some(step) = halted_at else {
            return Ok(());
        };

        for cleanup in self.steps.iter_mut().take(ran).rev() {
            debug!(step = cleanup.name(), "cleaning up step");
            cleanup.cleanup(ctx).await;
        }

        Err(ctx
            .error()
            .cloned()
            .unwrap_or(WorkflowError::Halted { step }))
    }
}
