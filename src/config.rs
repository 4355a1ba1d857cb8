//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

const MAX_TAG_LEN: usize = 255;

/// Droplet build configuration derived from defaults, configuration files,
/// and environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "DRYDOCK",
    discovery(
        app_name = "drydock",
        env_var = "DRYDOCK_CONFIG_PATH",
        config_file_name = "drydock.toml",
        dotfile_name = ".drydock.toml",
        project_file_name = "drydock.toml"
    )
)]
pub struct DropletConfig {
    /// Display name of the build droplet. A `drydock-<uuid>` name is
    /// generated when unset.
    pub droplet_name: Option<String>,
    /// Region slug the droplet is created in (for example `nyc3`).
    pub region: String,
    /// Size slug (for example `s-1vcpu-1gb`).
    pub size: String,
    /// Base image: a numeric image id or a slug such as `ubuntu-22-04-x64`.
    pub image: String,
    /// Account SSH key to install on the droplet. Zero means none.
    #[ortho_config(default = 0)]
    pub ssh_key_id: u64,
    /// Enables the private network interface.
    #[ortho_config(default = false)]
    pub private_networking: bool,
    /// Installs the provider monitoring agent.
    #[ortho_config(default = false)]
    pub monitoring: bool,
    /// Assigns a public IPv6 address.
    #[ortho_config(default = false)]
    pub ipv6: bool,
    /// Inline user-data payload.
    pub user_data: Option<String>,
    /// Path to a file holding the user-data payload.
    pub user_data_file: Option<String>,
    /// Tags applied to the droplet.
    #[serde(default)]
    pub tags: Vec<String>,
    /// VPC (network segment) the droplet joins.
    pub vpc_uuid: Option<String>,
    /// Reboots the droplet into recovery mode after creation.
    #[ortho_config(default = false)]
    pub recovery_mode: bool,
    /// Budget, in seconds, for each individual state wait.
    #[ortho_config(default = 360)]
    pub state_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl DropletConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to drydock.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("drydock")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Budget applied to every individual state wait.
    #[must_use]
    pub const fn state_timeout(&self) -> Duration {
        Duration::from_secs(self.state_timeout_secs)
    }

    /// Performs semantic validation. Error messages include guidance on how
    /// to provide missing values via environment variables or configuration
    /// files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required field is empty, both user-data
    /// sources are set, the state timeout is zero, or a tag is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.region,
            &FieldMetadata::new("droplet region", "DRYDOCK_REGION", "region"),
        )?;
        Self::require_field(
            &self.size,
            &FieldMetadata::new("droplet size", "DRYDOCK_SIZE", "size"),
        )?;
        Self::require_field(
            &self.image,
            &FieldMetadata::new("base image", "DRYDOCK_IMAGE", "image"),
        )?;

        if self.user_data.is_some() && self.user_data_file.is_some() {
            return Err(ConfigError::Conflict(String::from(
                "only one of user_data or user_data_file can be specified",
            )));
        }

        if self.state_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "state_timeout_secs must be greater than zero",
            )));
        }

        if let Some(tag) = self.tags.iter().find(|tag| !is_valid_tag(tag)) {
            return Err(ConfigError::Invalid(format!(
                "invalid tag '{tag}': tags must be 1-{MAX_TAG_LEN} characters of letters, \
                 digits, ':', '-' or '_'"
            )));
        }

        Ok(())
    }
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag.len() <= MAX_TAG_LEN
        && tag
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ':' | '-' | '_'))
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates two settings that cannot be combined.
    #[error("conflicting configuration: {0}")]
    Conflict(String),
    /// Indicates a value outside its accepted range or format.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn config() -> DropletConfig {
        DropletConfig {
            droplet_name: None,
            region: String::from("nyc3"),
            size: String::from("s-1vcpu-1gb"),
            image: String::from("ubuntu-22-04-x64"),
            ssh_key_id: 0,
            private_networking: false,
            monitoring: false,
            ipv6: false,
            user_data: None,
            user_data_file: None,
            tags: Vec::new(),
            vpc_uuid: None,
            recovery_mode: false,
            state_timeout_secs: 360,
        }
    }

    #[rstest]
    fn accepts_minimal_config(config: DropletConfig) {
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.state_timeout(), Duration::from_secs(360));
    }

    #[rstest]
    #[case::tag_with_colon("env:ci", true)]
    #[case::tag_with_space("has space", false)]
    #[case::empty_tag("", false)]
    fn tag_format_is_checked(mut config: DropletConfig, #[case] tag: &str, #[case] valid: bool) {
        config.tags = vec![tag.to_owned()];
        assert_eq!(config.validate().is_ok(), valid, "tag {tag:?}");
    }

    #[rstest]
    fn zero_timeout_is_rejected(mut config: DropletConfig) {
        config.state_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
