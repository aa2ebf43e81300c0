//! Configuration file for `ipmtctl`.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use ipmt_link::LinkConfig;
use ipmt_sim::SimConfig;
use serde::{Deserialize, Serialize};

/// Contents of the YAML file passed with `--config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Host link sizing.
    pub link: LinkConfig,
    /// How long to wait for each reply.
    pub reply_timeout_ms: u64,
    /// Address of a serial-over-TCP bridge. Without one the commands run
    /// against an in-process simulated mote.
    pub connect: Option<String>,
    /// Address `ipmtctl serve` listens on.
    pub serve_address: String,
    /// The simulated mote used by `serve` and by local runs.
    pub sim: SimConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            link: LinkConfig::default(),
            reply_timeout_ms: 2000,
            connect: None,
            serve_address: "127.0.0.1:9100".to_string(),
            sim: SimConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "
reply_timeout_ms: 500
connect: 10.0.0.5:9100
link:
  max_payload_len: 90
sim:
  network_id: 7
";
        let config: CliConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.reply_timeout(), Duration::from_millis(500));
        assert_eq!(config.connect.as_deref(), Some("10.0.0.5:9100"));
        assert_eq!(config.link.max_payload_len, 90);
        assert_eq!(config.link.input_buffer_size, 128);
        assert_eq!(config.sim.network_id, 7);
        assert_eq!(config.serve_address, "127.0.0.1:9100");
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = CliConfig::load(Path::new("/nonexistent/ipmtctl.yaml")).unwrap_err();
        assert!(err.to_string().contains("reading"));
    }
}
