use std::path::{Path, PathBuf};

use crate::config::schema::{AppConfig, CONFIG_VERSION};
use crate::error::ConfigError;
use crate::report::MAX_CHART_SIDE;

pub const CONFIG_FILE_NAME: &str = "safetrack.json";
pub const HOME_ENV_VAR: &str = "SAFETRACK_HOME";

/// `$SAFETRACK_HOME`, or `~/.safetrack`, or `./.safetrack` when no home
/// directory is known.
pub fn default_base_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".safetrack"))
        .unwrap_or_else(|| PathBuf::from(".safetrack"))
}

/// Loads a config file. Relative paths inside it resolve against the
/// file's directory.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config = load_config_from_str(&content)?;
    config.base_directory = path.parent().map(Path::to_path_buf);
    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// The config at `<base>/safetrack.json` if it exists, the defaults rooted
/// at `base` otherwise.
pub fn load_or_default(base: &Path) -> Result<AppConfig, ConfigError> {
    let path = base.join(CONFIG_FILE_NAME);
    if path.is_file() {
        load_config(&path)
    } else {
        Ok(AppConfig::with_base_dir(base))
    }
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    for (name, value) in [
        ("data_directory", &config.data_directory),
        ("upload_directory", &config.upload_directory),
        ("template_path", &config.template_path),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("'{}' must not be empty", name),
            });
        }
    }

    let side_ok = |side: u32| (1..=MAX_CHART_SIDE).contains(&side);
    if !side_ok(config.chart.width) || !side_ok(config.chart.height) {
        return Err(ConfigError::Validation {
            message: format!(
                "Chart size must be between 1 and {} px per side, got {}x{}",
                MAX_CHART_SIDE, config.chart.width, config.chart.height
            ),
        });
    }

    Ok(())
}
