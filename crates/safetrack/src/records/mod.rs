//! Record repositories: validation, derived fields and the attachment
//! lifecycle on top of the row-level `db` repositories.

pub mod checks;
pub mod dates;
pub mod inspections;
pub mod model;

pub use checks::CheckRepository;
pub use dates::{format_date, parse_date, parse_time, DateRange};
pub use inspections::InspectionRepository;
pub use model::{
    CheckDraft, CheckListing, CheckRecord, InspectionDraft, InspectionRecord, RecordFilter,
};

use crate::error::RecordError;

fn require_text(field: &'static str, value: &str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: i64) -> Result<(), RecordError> {
    if value < 0 {
        return Err(RecordError::invalid(field, format!("{} is negative", value)));
    }
    Ok(())
}
