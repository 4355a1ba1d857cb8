//! Test support utilities shared across unit and integration tests.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::client::{
    ClientFuture, ImageId, InstanceClient, InstanceId, InstanceState, InstanceStatus,
};
use crate::request::CreationRequest;
use crate::ui::Ui;

const FIRST_DROPLET_ID: u64 = 1000;

/// Client operation, used to script failures and count calls.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verb {
    /// [`InstanceClient::create`].
    Create,
    /// [`InstanceClient::delete`].
    Delete,
    /// [`InstanceClient::power_on`].
    PowerOn,
    /// [`InstanceClient::power_off`].
    PowerOff,
    /// [`InstanceClient::enable_recovery`].
    EnableRecovery,
    /// [`InstanceClient::fetch`].
    Fetch,
    /// [`InstanceClient::delete_image`].
    DeleteImage,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::PowerOn => "power_on",
            Self::PowerOff => "power_off",
            Self::EnableRecovery => "enable_recovery",
            Self::Fetch => "fetch",
            Self::DeleteImage => "delete_image",
        })
    }
}

/// Records a single call made through [`ScriptedClient`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientCall {
    /// Create with the requested droplet name.
    Create(String),
    /// Delete of a droplet.
    Delete(InstanceId),
    /// Power-on of a droplet.
    PowerOn(InstanceId),
    /// Power-off of a droplet.
    PowerOff(InstanceId),
    /// Recovery-mode toggle.
    EnableRecovery(InstanceId, bool),
    /// State fetch.
    Fetch(InstanceId),
    /// Delete of an image.
    DeleteImage(ImageId),
}

impl ClientCall {
    /// Verb of the call.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        match self {
            Self::Create(_) => Verb::Create,
            Self::Delete(_) => Verb::Delete,
            Self::PowerOn(_) => Verb::PowerOn,
            Self::PowerOff(_) => Verb::PowerOff,
            Self::EnableRecovery(..) => Verb::EnableRecovery,
            Self::Fetch(_) => Verb::Fetch,
            Self::DeleteImage(_) => Verb::DeleteImage,
        }
    }
}

/// Error returned by the scripted client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedClientError {
    /// The verb was scripted to fail with [`ScriptedClient::fail`].
    #[error("scripted {verb} failure")]
    Scripted {
        /// Verb that failed.
        verb: Verb,
    },
    /// An action arrived while an earlier one still held the droplet lock.
    #[error("{verb} rejected: droplet is locked by an action in progress")]
    Locked {
        /// Verb that was rejected.
        verb: Verb,
    },
    /// The droplet does not exist (never created, or deleted).
    #[error("droplet not found")]
    NotFound,
}

/// State change an accepted action eventually applies.
#[derive(Clone, Copy, Debug)]
enum Change {
    Status(&'static str),
    Recovery(bool),
}

#[derive(Debug)]
struct Droplet {
    id: InstanceId,
    status: InstanceStatus,
    recovery_mode: bool,
}

#[derive(Debug)]
struct Script {
    calls: Vec<ClientCall>,
    failing: Vec<Verb>,
    stalled: Vec<Verb>,
    droplet: Option<Droplet>,
    created: u64,
    locked_fetches: u32,
    lock_span: u32,
    failing_fetches: u32,
    transition_delay: u32,
    pending: Option<(u32, Change)>,
    rejected: Vec<Verb>,
    last_request: Option<CreationRequest>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            failing: Vec::new(),
            stalled: Vec::new(),
            droplet: None,
            created: 0,
            locked_fetches: 0,
            lock_span: 1,
            failing_fetches: 0,
            transition_delay: 0,
            pending: None,
            rejected: Vec::new(),
            last_request: None,
        }
    }
}

impl Droplet {
    fn apply(&mut self, change: Change) {
        match change {
            Change::Status(label) => self.status = InstanceStatus::from(label),
            Change::Recovery(enabled) => self.recovery_mode = enabled,
        }
    }
}

impl Script {
    fn fails(&self, verb: Verb) -> Result<(), ScriptedClientError> {
        if self.failing.contains(&verb) {
            Err(ScriptedClientError::Scripted { verb })
        } else {
            Ok(())
        }
    }

    /// Accepts an action unless the droplet is locked. An accepted action
    /// takes the lock for `lock_span` fetches and, unless the verb is
    /// stalled, schedules its state change.
    fn accept(&mut self, verb: Verb, change: Change) -> Result<(), ScriptedClientError> {
        self.fails(verb)?;
        if self.locked_fetches > 0 {
            self.rejected.push(verb);
            return Err(ScriptedClientError::Locked { verb });
        }
        self.locked_fetches = self.lock_span;
        if self.stalled.contains(&verb) {
            return Ok(());
        }
        if self.transition_delay == 0 {
            if let Some(droplet) = self.droplet.as_mut() {
                droplet.apply(change);
            }
        } else {
            self.pending = Some((self.transition_delay, change));
        }
        Ok(())
    }

    fn settle_pending(&mut self) {
        let Some((remaining, change)) = self.pending.take() else {
            return;
        };
        if remaining > 0 {
            self.pending = Some((remaining - 1, change));
        } else if let Some(droplet) = self.droplet.as_mut() {
            droplet.apply(change);
        }
    }

    fn fetch(&mut self, id: InstanceId) -> Result<InstanceState, ScriptedClientError> {
        if self.failing_fetches > 0 {
            self.failing_fetches -= 1;
            return Err(ScriptedClientError::Scripted { verb: Verb::Fetch });
        }
        self.settle_pending();
        let locked = self.locked_fetches > 0;
        self.locked_fetches = self.locked_fetches.saturating_sub(1);

        let droplet = self
            .droplet
            .as_mut()
            .filter(|droplet| droplet.id == id)
            .ok_or(ScriptedClientError::NotFound)?;
        let state = InstanceState {
            id,
            status: droplet.status.clone(),
            locked,
            recovery_mode: droplet.recovery_mode,
        };
        if droplet.status.as_str() == "new" {
            droplet.status = InstanceStatus::from("active");
        }
        Ok(state)
    }
}

/// In-memory droplet API that simulates provider state transitions.
///
/// A created droplet reports `new` once and `active` afterwards. Every
/// accepted action locks the droplet for the next fetch, and actions that
/// arrive while the lock is held are rejected the way the provider rejects
/// them. Failures, stalls, lock spans, delayed transitions and transient
/// fetch errors can be scripted up front.
#[derive(Clone, Debug, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedClient {
    /// Creates a client with no droplet and no scripted failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every call of `verb` fail. The call is still recorded.
    pub fn fail(&self, verb: Verb) {
        self.script().failing.push(verb);
    }

    /// Makes `verb` succeed without changing droplet state.
    pub fn stall(&self, verb: Verb) {
        self.script().stalled.push(verb);
    }

    /// Makes the next `count` fetches fail before normal behaviour resumes.
    pub fn fail_next_fetches(&self, count: u32) {
        self.script().failing_fetches = count;
    }

    /// Makes the next `count` fetches report the droplet as locked, as if
    /// an action outside the workflow were in progress.
    pub fn lock_for_fetches(&self, count: u32) {
        self.script().locked_fetches = count;
    }

    /// Makes every accepted action hold the lock for `count` fetches
    /// instead of one.
    pub fn hold_locks_for(&self, count: u32) {
        self.script().lock_span = count;
    }

    /// Delays the state change of every accepted action until `count`
    /// further fetches have reported the old state.
    pub fn delay_transitions(&self, count: u32) {
        self.script().transition_delay = count;
    }

    /// Actions rejected because the droplet was locked.
    #[must_use]
    pub fn rejected_while_locked(&self) -> Vec<Verb> {
        self.script().rejected.clone()
    }

    /// Snapshot of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ClientCall> {
        self.script().calls.clone()
    }

    /// Calls other than state fetches, in order.
    #[must_use]
    pub fn actions(&self) -> Vec<ClientCall> {
        self.script()
            .calls
            .iter()
            .filter(|call| call.verb() != Verb::Fetch)
            .cloned()
            .collect()
    }

    /// Number of calls of `verb`.
    #[must_use]
    pub fn count(&self, verb: Verb) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| call.verb() == verb)
            .count()
    }

    /// Request passed to the most recent create call.
    #[must_use]
    pub fn last_request(&self) -> Option<CreationRequest> {
        self.script().last_request.clone()
    }

    /// Current status of the simulated droplet, if it exists.
    #[must_use]
    pub fn droplet_status(&self) -> Option<String> {
        self.script()
            .droplet
            .as_ref()
            .map(|droplet| droplet.status.as_str().to_owned())
    }

    fn record(&self, call: ClientCall) -> MutexGuard<'_, Script> {
        let mut script = self.script();
        script.calls.push(call);
        script
    }

    fn action(&self, call: ClientCall, change: Change) -> Result<(), ScriptedClientError> {
        let verb = call.verb();
        self.record(call).accept(verb, change)
    }
}

impl InstanceClient for ScriptedClient {
    type Error = ScriptedClientError;

    fn create<'a>(
        &'a self,
        request: &'a CreationRequest,
    ) -> ClientFuture<'a, InstanceId, Self::Error> {
        let outcome = {
            let mut script = self.record(ClientCall::Create(request.name.clone()));
            script.last_request = Some(request.clone());
            script.fails(Verb::Create).map(|()| {
                let id = InstanceId::new(FIRST_DROPLET_ID + script.created);
                script.created += 1;
                script.droplet = Some(Droplet {
                    id,
                    status: InstanceStatus::from("new"),
                    recovery_mode: false,
                });
                id
            })
        };
        Box::pin(async move { outcome })
    }

    fn delete(&self, id: InstanceId) -> ClientFuture<'_, (), Self::Error> {
        let outcome = {
            let mut script = self.record(ClientCall::Delete(id));
            script.fails(Verb::Delete).map(|()| {
                if script.droplet.as_ref().is_some_and(|droplet| droplet.id == id) {
                    script.droplet = None;
                }
            })
        };
        Box::pin(async move { outcome })
    }

    fn power_on(&self, id: InstanceId) -> ClientFuture<'_, (), Self::Error> {
        let outcome = self.action(ClientCall::PowerOn(id), Change::Status("active"));
        Box::pin(async move { outcome })
    }

    fn power_off(&self, id: InstanceId) -> ClientFuture<'_, (), Self::Error> {
        let outcome = self.action(ClientCall::PowerOff(id), Change::Status("off"));
        Box::pin(async move { outcome })
    }

    fn enable_recovery(&self, id: InstanceId, enabled: bool) -> ClientFuture<'_, (), Self::Error> {
        let outcome = self.action(
            ClientCall::EnableRecovery(id, enabled),
            Change::Recovery(enabled),
        );
        Box::pin(async move { outcome })
    }

    fn fetch(&self, id: InstanceId) -> ClientFuture<'_, InstanceState, Self::Error> {
        let outcome = self.record(ClientCall::Fetch(id)).fetch(id);
        Box::pin(async move { outcome })
    }

    fn delete_image(&self, id: ImageId) -> ClientFuture<'_, (), Self::Error> {
        let outcome = self
            .record(ClientCall::DeleteImage(id))
            .fails(Verb::DeleteImage);
        Box::pin(async move { outcome })
    }
}

/// Line captured by [`RecordingUi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UiLine {
    /// Progress line.
    Say(String),
    /// Error line.
    Error(String),
}

/// Output sink that keeps every line for assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingUi {
    lines: Arc<Mutex<Vec<UiLine>>>,
}

impl RecordingUi {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line so far.
    #[must_use]
    pub fn lines(&self) -> Vec<UiLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Error lines only.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                UiLine::Error(message) => Some(message),
                UiLine::Say(_) => None,
            })
            .collect()
    }

    fn push(&self, line: UiLine) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

impl Ui for RecordingUi {
    fn say(&self, message: &str) {
        self.push(UiLine::Say(message.to_owned()));
    }

    fn error(&self, message: &str) {
        self.push(UiLine::Error(message.to_owned()));
    }
}
