//! Everything a front end needs, opened from one [`AppConfig`].

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::{database_path, Database};
use crate::error::{Result, StorageError};
use crate::records::{CheckRepository, InspectionRepository};
use crate::registry::OrganizationRegistry;
use crate::report::{
    find_system_font, load_font, write_default_template, ActGenerator, LineChart, TrendReporter,
};
use crate::storage::AttachmentStore;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub db: Database,
    pub attachments: Arc<AttachmentStore>,
    pub organizations: OrganizationRegistry,
    pub inspections: InspectionRepository,
    pub checks: CheckRepository,
    pub acts: Arc<ActGenerator>,
    pub trends: TrendReporter,
}

impl AppContext {
    /// Creates the data and upload directories, opens (and migrates) the
    /// database and writes the default act template if none exists.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let data_dir = config.data_dir();
        let upload_dir = config.upload_dir();
        ensure_directory(&data_dir)?;
        ensure_directory(&upload_dir)?;

        let db = Database::open(&database_path(&data_dir))?;
        let template = config.template();
        write_default_template(&template)?;

        let attachments = Arc::new(AttachmentStore::new(db.clone(), &upload_dir));
        let renderer = Arc::new(chart_renderer(config));

        info!(
            data = %data_dir.display(),
            uploads = %upload_dir.display(),
            "Application context opened"
        );

        Ok(Self {
            config: config.clone(),
            organizations: OrganizationRegistry::new(db.clone()),
            inspections: InspectionRepository::new(db.clone(), attachments.clone()),
            checks: CheckRepository::new(db.clone(), attachments.clone()),
            acts: Arc::new(ActGenerator::new(template)),
            trends: TrendReporter::new(db.clone(), renderer),
            attachments,
            db,
        })
    }
}

/// Line chart sized from the config. Captions need a font; without one the
/// chart is still drawn.
fn chart_renderer(config: &AppConfig) -> LineChart {
    let chart = LineChart::new(config.chart.width, config.chart.height);
    let Some(path) = config.chart_font().or_else(find_system_font) else {
        warn!("No chart font found, trend charts will have no captions");
        return chart;
    };
    match load_font(&path) {
        Ok(font) => chart.with_font(font),
        Err(e) => {
            warn!(error = %e, "Chart font unusable, trend charts will have no captions");
            chart
        }
    }
}

fn ensure_directory(path: &Path) -> std::result::Result<(), StorageError> {
    std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_lays_out_base_directory() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::with_base_dir(dir.path());

        let ctx = AppContext::open(&config).unwrap();

        assert!(dir.path().join("data").join("safetrack.db").is_file());
        assert!(dir.path().join("uploads").is_dir());
        assert!(ctx.acts.template_path().is_file());
        assert_eq!(ctx.attachments.root(), dir.path().join("uploads"));
    }

    #[test]
    fn test_broken_chart_font_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.ttf"), b"not a font").unwrap();
        let mut config = AppConfig::with_base_dir(dir.path());
        config.chart.font_path = Some("broken.ttf".to_string());

        assert!(!chart_renderer(&config).has_font());
        assert!(AppContext::open(&config).is_ok());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::with_base_dir(dir.path());

        AppContext::open(&config)
            .unwrap()
            .organizations
            .add("ООО Монтаж")
            .unwrap();
        let ctx = AppContext::open(&config).unwrap();

        assert_eq!(ctx.organizations.names().unwrap(), vec!["ООО Монтаж"]);
    }
}
