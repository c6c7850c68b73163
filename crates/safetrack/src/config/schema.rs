use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: String,
    /// Holds `safetrack.db`.
    #[serde(default = "default_data_directory")]
    pub data_directory: String,
    /// Root of the attachment store.
    #[serde(default = "default_upload_directory")]
    pub upload_directory: String,
    /// The `.docx` act template.
    #[serde(default = "default_template_path")]
    pub template_path: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    /// Directory relative paths are resolved against. Not read from the
    /// file; set by the loader.
    #[serde(skip)]
    pub base_directory: Option<PathBuf>,
}

fn default_data_directory() -> String {
    "data".to_string()
}

fn default_upload_directory() -> String {
    "uploads".to_string()
}

fn default_template_path() -> String {
    "act_template.docx".to_string()
}

impl AppConfig {
    /// Default configuration rooted at `base`.
    pub fn with_base_dir(base: impl Into<PathBuf>) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            data_directory: default_data_directory(),
            upload_directory: default_upload_directory(),
            template_path: default_template_path(),
            logging: LoggingConfig::default(),
            chart: ChartConfig::default(),
            base_directory: Some(base.into()),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.data_directory)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.resolve(&self.upload_directory)
    }

    pub fn template(&self) -> PathBuf {
        self.resolve(&self.template_path)
    }

    /// Configured chart font, if any.
    pub fn chart_font(&self) -> Option<PathBuf> {
        self.chart.font_path.as_deref().map(|path| self.resolve(path))
    }

    fn resolve(&self, value: &str) -> PathBuf {
        let path = Path::new(value);
        match &self.base_directory {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Trend chart image settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_width")]
    pub width: u32,
    #[serde(default = "default_chart_height")]
    pub height: u32,
    /// TrueType font for captions and tick labels. A common system font
    /// is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
}

fn default_chart_width() -> u32 {
    800
}

fn default_chart_height() -> u32 {
    400
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
            font_path: None,
        }
    }
}
