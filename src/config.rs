use crate::models::AppConfig;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, String> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    // Read the file
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

    // Parse YAML
    let config: AppConfig = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse YAML config: {}", e))?;

    Ok(config)
}

/// Load configuration with fallback options, apply environment overrides and
/// validate the result.
///
/// Order: `CONFIG_PATH`, then `config.yaml` / `config.yml` in the working
/// directory, then built-in defaults.
pub fn load_config_with_fallback() -> Result<Arc<AppConfig>, String> {
    let mut config = find_config_file().unwrap_or_else(|| {
        warn!("No configuration file found, using defaults");
        AppConfig::default()
    });

    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;

    info!(
        "Configuration ready: listen {}:{}, session TTL {}s, sweep every {}s, credentials {}",
        config.server.host,
        config.server.port,
        config.session.ttl_secs,
        config.session.sweep_interval_secs,
        config.credentials.path.display()
    );
    if config.admin.key.is_none() {
        info!("No admin key configured; /admin/sessions is disabled");
    }

    Ok(Arc::new(config))
}

fn find_config_file() -> Option<AppConfig> {
    // Try loading from environment variable first
    if let Ok(config_path) = std::env::var("CONFIG_PATH") {
        match load_config(&config_path) {
            Ok(config) => return Some(config),
            Err(e) => warn!(
                "Failed to load config from CONFIG_PATH ({}): {}",
                config_path, e
            ),
        }
    }

    // Try common config file locations
    for path in ["config.yaml", "config.yml"] {
        if Path::new(path).exists() {
            match load_config(path) {
                Ok(config) => return Some(config),
                Err(e) => warn!("Failed to load config from '{}': {}", path, e),
            }
        }
    }

    None
}
