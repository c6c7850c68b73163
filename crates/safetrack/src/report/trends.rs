use std::sync::Arc;

use tracing::{info, info_span};

use super::chart::{ChartPoint, ChartRenderer, ChartTitles};
use super::xlsx::{Cell, Workbook};
use crate::db::{check_repo, Database};
use crate::error::ReportError;
use crate::records::DateRange;

pub const DATA_SHEET: &str = "Данные";
pub const CHART_SHEET: &str = "График";
pub const DATA_HEADER: [&str; 2] = ["date", "violations_count"];
pub const X_AXIS_TITLE: &str = "Дата";
pub const Y_AXIS_TITLE: &str = "Количество нарушений";

pub fn chart_title(organization: &str) -> String {
    format!("Динамика нарушений для {}", organization)
}

/// Violation counts of one organization over time, as a workbook with the
/// raw points and a line chart of them.
#[derive(Clone)]
pub struct TrendReporter {
    db: Database,
    renderer: Arc<dyn ChartRenderer>,
}

impl TrendReporter {
    pub fn new(db: Database, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { db, renderer }
    }

    /// `(date, violations_count)` of the organization's checks within
    /// `range`, in calendar order.
    pub fn violation_series(
        &self,
        organization: &str,
        range: &DateRange,
    ) -> Result<Vec<(String, i64)>, ReportError> {
        Ok(check_repo::violation_points(&self.db, organization, range)?)
    }

    /// Builds the trend workbook. An empty series still yields a workbook
    /// with the header row and an empty chart.
    pub fn violations(
        &self,
        organization: &str,
        range: &DateRange,
    ) -> Result<Vec<u8>, ReportError> {
        let _span = info_span!("report.violations", organization = %organization).entered();

        let series = self.violation_series(organization, range)?;
        let points: Vec<ChartPoint> = series
            .iter()
            .map(|(date, count)| ChartPoint::new(date.clone(), *count as f64))
            .collect();
        let rows: Vec<Vec<Cell>> = series
            .into_iter()
            .map(|(date, count)| vec![Cell::from(date), Cell::from(count)])
            .collect();

        let title = chart_title(organization);
        let titles = ChartTitles {
            title: &title,
            x_axis: X_AXIS_TITLE,
            y_axis: Y_AXIS_TITLE,
        };
        let png = self.renderer.render_png(&titles, &points)?;
        let (width, height) = self.renderer.dimensions();

        let mut workbook = Workbook::new();
        workbook
            .add_data_sheet(DATA_SHEET, &DATA_HEADER, rows)
            .add_image_sheet(CHART_SHEET, png, width, height);
        let bytes = workbook.to_bytes()?;

        info!(points = points.len(), bytes = bytes.len(), "Violation trend built");
        Ok(bytes)
    }
}
