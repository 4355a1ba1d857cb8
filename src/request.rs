//! Creation request assembled from resolved configuration.

use serde::Serialize;
use uuid::Uuid;

use crate::client::SshKeyId;
use crate::config::DropletConfig;
use crate::user_data::{UserDataError, resolve_user_data};

/// Base image for a new droplet.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImageRef {
    /// Numeric image or snapshot identifier.
    Id(u64),
    /// Symbolic image slug such as `ubuntu-22-04-x64`.
    Slug(String),
}

impl ImageRef {
    /// Resolves a configured image reference.
    ///
    /// The decision is purely lexical: a value that parses as an unsigned
    /// integer is an id, anything else is used verbatim as a slug.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        value
            .parse::<u64>()
            .map_or_else(|_| Self::Slug(value.to_owned()), Self::Id)
    }
}

/// Parameters sent to [`crate::client::InstanceClient::create`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CreationRequest {
    /// Display name of the droplet.
    pub name: String,
    /// Region slug.
    pub region: String,
    /// Size slug.
    pub size: String,
    /// Base image.
    pub image: ImageRef,
    /// SSH keys installed at boot, in the order they were resolved.
    pub ssh_keys: Vec<SshKeyId>,
    /// Enables the private network interface.
    pub private_networking: bool,
    /// Installs the monitoring agent.
    pub monitoring: bool,
    /// Assigns a public IPv6 address.
    pub ipv6: bool,
    /// Opaque user-data payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    /// Droplet tags.
    pub tags: Vec<String>,
    /// VPC the droplet joins.
    #[serde(rename = "vpc_uuid", skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
}

impl CreationRequest {
    /// Builds the request the creation step sends for `config`.
    ///
    /// `preset_ssh_key` is a key produced by an earlier pipeline stage; it is
    /// listed before the configured key.
    ///
    /// # Errors
    ///
    /// Returns [`UserDataError`] when the user-data file cannot be read.
    pub fn from_config(
        config: &DropletConfig,
        preset_ssh_key: Option<SshKeyId>,
    ) -> Result<Self, UserDataError> {
        let user_data =
            resolve_user_data(config.user_data.as_deref(), config.user_data_file.as_deref())?;
        let name = config
            .droplet_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(generated_name);

        Ok(Self {
            name,
            region: config.region.clone(),
            size: config.size.clone(),
            image: ImageRef::parse(&config.image),
            ssh_keys: ssh_keys(preset_ssh_key, config.ssh_key_id),
            private_networking: config.private_networking,
            monitoring: config.monitoring,
            ipv6: config.ipv6,
            user_data,
            tags: config.tags.clone(),
            vpc_id: config.vpc_uuid.clone(),
        })
    }
}

/// Orders SSH keys: preset key first, configured key second, absent keys
/// (zero for the configured one) omitted.
#[must_use]
pub fn ssh_keys(preset: Option<SshKeyId>, configured: u64) -> Vec<SshKeyId> {
    preset
        .into_iter()
        .chain((configured != 0).then_some(SshKeyId::new(configured)))
        .collect()
}

fn generated_name() -> String {
    format!("drydock-{}", Uuid::new_v4().simple())
}
