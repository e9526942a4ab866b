use crate::analysis::Roi;
use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use tracing::info;

/// Environment variable that replaces the configured ROI, formatted `x,y,w,h`
pub const ROI_ENV_VAR: &str = "DWELL_ROI";

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        Self::from_yaml_str(&contents).with_context(|| format!("Failed to parse config {}", path))
    }

    /// Apply `DWELL_ROI` if set. Call after logging is up so the override is reported.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(ROI_ENV_VAR) {
            self.override_roi(&raw)?;
        }
        Ok(())
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Replace the ROI with one selected outside the config file
    pub fn override_roi(&mut self, raw: &str) -> Result<()> {
        let roi: Roi = raw
            .parse()
            .with_context(|| format!("Invalid {} value '{}'", ROI_ENV_VAR, raw))?;
        info!("ROI overridden from {}: {}", ROI_ENV_VAR, roi);
        self.roi = roi;
        Ok(())
    }
}
