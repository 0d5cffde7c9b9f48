pub mod brightness;
pub mod config;
pub mod devices;
pub mod reset;
pub mod run;
pub mod sensors;

use std::path::Path;

use deckstats_core::{DashboardConfig, Result};

/// Load `path` if given, otherwise the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => {
            log::debug!("loading configuration from {}", path.display());
            DashboardConfig::load_from_path(path)
        }
        None => Ok(DashboardConfig::default()),
    }
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub interval_ms: Option<u64>,
    pub brightness: Option<u8>,
}

/// Apply `overrides` and re-validate.
pub fn apply_overrides(
    mut config: DashboardConfig,
    overrides: Overrides,
) -> Result<DashboardConfig> {
    if let Some(ms) = overrides.interval_ms {
        config.interval_ms = ms;
    }
    if overrides.brightness.is_some() {
        config.brightness = overrides.brightness;
    }
    config.validate()?;
    Ok(config)
}

/// Load, override and validate, or print the error and exit.
pub fn effective_config_or_exit(path: Option<&Path>, overrides: Overrides) -> DashboardConfig {
    match load_config(path).and_then(|c| apply_overrides(c, overrides)) {
        Ok(config) => config,
        Err(e) => {
            match path {
                Some(p) => eprintln!("Error in configuration {}: {e}", p.display()),
                None => eprintln!("Error in configuration: {e}"),
            }
            std::process::exit(1);
        }
    }
}
