//! Image artifact produced by a successful workflow.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::client::{ImageId, InstanceClient};
use crate::context::WorkflowContext;

/// Identifier of the builder that produces [`Artifact`]s.
pub const BUILDER_ID: &str = "drydock.droplet";

/// Snapshot image left behind by a workflow.
pub struct Artifact<C> {
    snapshot_name: String,
    snapshot_id: ImageId,
    region_names: Vec<String>,
    client: Arc<C>,
    state_data: BTreeMap<String, Value>,
}

impl<C: InstanceClient> Artifact<C> {
    /// Records a snapshot available in `region_names`, listed in the order
    /// they were supplied.
    #[must_use]
    pub fn new(
        snapshot_name: impl Into<String>,
        snapshot_id: ImageId,
        region_names: Vec<String>,
        client: Arc<C>,
        state_data: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            snapshot_name: snapshot_name.into(),
            snapshot_id,
            region_names,
            client,
            state_data,
        }
    }

    /// Records a snapshot taken at the end of the workflow behind `ctx`,
    /// sharing its client and copying its generated data.
    #[must_use]
    pub fn from_context(
        ctx: &WorkflowContext<C>,
        snapshot_name: impl Into<String>,
        snapshot_id: ImageId,
        region_names: Vec<String>,
    ) -> Self {
        Self::new(
            snapshot_name,
            snapshot_id,
            region_names,
            ctx.client(),
            ctx.generated_data().clone(),
        )
    }

    /// Identifier of the producing builder.
    #[must_use]
    pub const fn builder_id(&self) -> &'static str {
        BUILDER_ID
    }

    /// Local files backing the artifact. Always empty: the image lives with
    /// the provider.
    #[must_use]
    pub const fn files(&self) -> &[String] {
        &[]
    }

    /// Stable key of the form `region,region:image_id`.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}:{}", self.region_names.join(","), self.snapshot_id)
    }

    /// Human-readable summary.
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Value recorded by the workflow under `key`, if any.
    #[must_use]
    pub fn state(&self, key: &str) -> Option<&Value> {
        self.state_data.get(key)
    }

    /// Deletes the image. Each call issues a fresh delete request.
    ///
    /// # Errors
    ///
    /// Returns the client error unchanged.
    pub async fn destroy(&self) -> Result<(), C::Error> {
        info!(image_id = %self.snapshot_id, name = %self.snapshot_name, "destroying image");
        self.client.delete_image(self.snapshot_id).await
    }
}

impl<C> fmt::Display for Artifact<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A snapshot was created: '{}' (ID: {}) in regions '{}'",
            self.snapshot_name,
            self.snapshot_id,
            self.region_names.join(",")
        )
    }
}

impl<C> fmt::Debug for Artifact<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("snapshot_name", &self.snapshot_name)
            .field("snapshot_id", &self.snapshot_id)
            .field("region_names", &self.region_names)
            .field("state_data", &self.state_data)
            .finish_non_exhaustive()
    }
}
