pub mod loader;
pub mod schema;

pub use loader::{
    default_base_dir, load_config, load_config_from_str, load_or_default, CONFIG_FILE_NAME,
    HOME_ENV_VAR,
};
pub use schema::{AppConfig, ChartConfig, LogFormat, LoggingConfig};
