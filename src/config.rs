//! Configuration
//!
//! YAML file with the MIDI ports to open, device detection settings and
//! mapping options.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub midi: MidiConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

/// MIDI port configuration, matched as case-insensitive substrings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    pub input_port: String,
    pub output_port: String,
}

/// Device detection settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BootstrapConfig {
    /// `(reported name, device id)` pairs checked before sending an enquiry
    #[serde(default)]
    pub name_associations: Vec<(String, String)>,
    #[serde(default)]
    pub skip_enquiry: bool,
    /// Seconds to wait for an enquiry response
    #[serde(default = "default_detection_timeout")]
    pub detection_timeout: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            name_associations: Vec::new(),
            skip_enquiry: false,
            detection_timeout: default_detection_timeout(),
        }
    }
}

impl BootstrapConfig {
    /// Detection timeout as a `Duration`
    ///
    /// Values too large for a `Duration` saturate to `Duration::MAX`. Negative
    /// or NaN values, which only get here when built in code, use the default.
    pub fn timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.detection_timeout) {
            Ok(timeout) => timeout,
            Err(_) if self.detection_timeout > 0.0 => Duration::MAX,
            Err(_) => Duration::from_secs_f64(default_detection_timeout()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PluginsConfig {
    /// Snap values near a control's default onto it
    #[serde(default = "default_true")]
    pub do_snap: bool,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            do_snap: default_true(),
        }
    }
}

fn default_detection_timeout() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.midi.input_port.is_empty() {
            anyhow::bail!("MIDI input_port cannot be empty");
        }
        if self.midi.output_port.is_empty() {
            anyhow::bail!("MIDI output_port cannot be empty");
        }

        let timeout = self.bootstrap.detection_timeout;
        if !timeout.is_finite() || timeout < 0.0 {
            anyhow::bail!("bootstrap.detection_timeout must be a non-negative number of seconds, got {}", timeout);
        }

        for (name, id) in &self.bootstrap.name_associations {
            if name.is_empty() || id.is_empty() {
                anyhow::bail!("Name associations need both a device name and an id");
            }
        }

        Ok(())
    }
}
