//! Report generation: inspection acts (`.docx`), violation trend workbooks
//! and whole-table exports (`.xlsx`).

pub mod chart;
pub mod docx;
pub mod tables;
pub mod trends;
pub mod xlsx;

pub use chart::{
    find_system_font, load_font, ChartPoint, ChartRenderer, ChartTitles, LineChart, MAX_CHART_SIDE,
};
pub use docx::{default_act_template, write_default_template, ActGenerator, ACT_FIELDS};
pub use tables::{export_checks, export_inspections};
pub use trends::TrendReporter;
pub use xlsx::{Cell, Workbook};
