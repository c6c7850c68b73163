pub mod app;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod navigation;
pub mod records;
pub mod registry;
pub mod report;
pub mod sanitize;
pub mod storage;
pub mod telemetry;

pub use app::AppContext;
pub use config::{load_config, AppConfig};
pub use db::{Database, DatabaseError};
pub use error::{
    ConfigError, RecordError, RegistryError, ReportError, Result, SafetrackError, StorageError,
};
pub use navigation::{navigate, NavAction, Section};
pub use records::{
    CheckDraft, CheckListing, CheckRecord, CheckRepository, DateRange, InspectionDraft,
    InspectionRecord, InspectionRepository, RecordFilter,
};
pub use registry::OrganizationRegistry;
pub use report::{ActGenerator, ChartRenderer, ChartTitles, LineChart, TrendReporter};
pub use storage::{AttachmentStore, Upload};
pub use telemetry::init_logging;
