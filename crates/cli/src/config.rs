//! CLI configuration utilities

use anyhow::{Context as _, Result};
use pledge_http::PledgeConfig;
use std::path::{Path, PathBuf};

/// Data directory: the explicit one, else the platform data directory
pub fn data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        directories::ProjectDirs::from("dev", "pledge", "pledge")
            .map_or_else(|| PathBuf::from(".pledge"), |dirs| dirs.data_dir().to_path_buf())
    })
}

/// Load configuration from defaults, the optional file and `PLEDGE__*`
/// environment variables
pub fn load_config(path: Option<&Path>) -> Result<PledgeConfig> {
    PledgeConfig::load(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })
}

/// Render a configuration in the format implied by the file extension
pub fn render_config(config: &PledgeConfig, path: &Path) -> Result<String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(serde_json::to_string_pretty(config)?),
        Some("toml") | None => Ok(toml::to_string_pretty(config)?),
        Some(other) => anyhow::bail!("Unsupported configuration format: {other} (use .toml or .json)"),
    }
}

/// Generate a default configuration file
pub fn generate_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, pass --force to overwrite",
            path.display()
        );
    }
    let content = render_config(&PledgeConfig::default(), path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
