use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SafetrackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Organization error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Logging setup failed: {0}")]
    Telemetry(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Constraint violations on the organization list. The messages are shown
/// to the user as-is.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Organization name must not be empty")]
    EmptyName,

    #[error("New organization name must differ from the old one")]
    Unchanged,

    #[error("Organization '{0}' already exists")]
    Duplicate(String),

    #[error("Organization '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("{kind} record {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RecordError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Template not found: {0}")]
    TemplateMissing(PathBuf),

    #[error("Failed to read template '{path}': {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid document package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("XML error in '{part}': {reason}")]
    Xml { part: String, reason: String },

    #[error("Chart rendering failed: {0}")]
    Chart(#[from] image::ImageError),

    #[error("Chart size {width}x{height} is out of range")]
    ChartSize { width: u32, height: u32 },

    #[error("Failed to load chart font '{path}': {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("IO error while writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] crate::db::DatabaseError),
}

impl ReportError {
    pub(crate) fn xml(part: &str, reason: impl std::fmt::Display) -> Self {
        Self::Xml {
            part: part.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SafetrackError>;
