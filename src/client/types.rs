//! Newtypes for droplet lifecycle values to avoid stringly- and
//! integer-typed code.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw provider identifier.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw provider identifier.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Provider identifier of a droplet. Only meaningful once creation
    /// succeeded.
    InstanceId
);
numeric_id!(
    /// Provider identifier of an image or snapshot.
    ImageId
);
numeric_id!(
    /// Provider identifier of an SSH key registered with the account.
    SshKeyId
);

/// Lifecycle label reported by the provider (`new`, `active`, `off`, ...).
///
/// The set is open-ended, so the label is kept verbatim.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct InstanceStatus(String);

impl InstanceStatus {
    /// Creates a status from any string-like label.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the raw label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for InstanceStatus {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for InstanceStatus {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for InstanceStatus {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for InstanceStatus {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time view of a droplet as returned by a fetch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceState {
    /// Provider identifier.
    pub id: InstanceId,
    /// Lifecycle label.
    pub status: InstanceStatus,
    /// True while a provider action is in flight; new actions are rejected.
    pub locked: bool,
    /// True once the droplet reports that it booted into recovery mode.
    pub recovery_mode: bool,
}
