//! Shared droplet configuration fixture for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing the fixture under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/droplet_config.rs"]
//! mod droplet_config;
//! ```

use drydock::DropletConfig;

/// Complete configuration for a plain build droplet in `nyc3`.
pub fn droplet_config(name: &str) -> DropletConfig {
    DropletConfig {
        droplet_name: Some(name.to_owned()),
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
