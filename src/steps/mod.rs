//! Concrete workflow steps.

mod create_droplet;

pub use create_droplet::CreateDropletStep;
