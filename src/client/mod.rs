//! Boundary to the remote droplet API.
//!
//! The crate never talks HTTP itself. Provisioning code is written against
//! [`InstanceClient`], and callers plug in whichever implementation they own
//! (the test suite uses [`crate::test_support::ScriptedClient`]).

mod types;

use std::future::Future;
use std::pin::Pin;

use crate::request::CreationRequest;

pub use types::{ImageId, InstanceId, InstanceState, InstanceStatus, SshKeyId};

/// Future returned by client operations.
pub type ClientFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Verbs the provisioning workflow needs from the remote service.
///
/// All calls are request/response from the caller's point of view; state
/// changes they trigger are observed by polling [`InstanceClient::fetch`].
/// Implementations must be safe to share between concurrent workflows.
pub trait InstanceClient: Send + Sync {
    /// Provider specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a droplet and returns its identifier.
    fn create<'a>(
        &'a self,
        request: &'a CreationRequest,
    ) -> ClientFuture<'a, InstanceId, Self::Error>;

    /// Deletes a droplet.
    fn delete(&self, id: InstanceId) -> ClientFuture<'_, (), Self::Error>;

    /// Issues a power-on action.
    fn power_on(&self, id: InstanceId) -> ClientFuture<'_, (), Self::Error>;

    /// Issues a power-off action.
    fn power_off(&self, id: InstanceId) -> ClientFuture<'_, (), Self::Error>;

    /// Toggles the recovery boot mode.
    fn enable_recovery(&self, id: InstanceId, enabled: bool) -> ClientFuture<'_, (), Self::Error>;

    /// Fetches the current state of a droplet.
    fn fetch(&self, id: InstanceId) -> ClientFuture<'_, InstanceState, Self::Error>;

    /// Deletes an image or snapshot.
    fn delete_image(&self, id: ImageId) -> ClientFuture<'_, (), Self::Error>;
}
