use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, info_span, warn};

use super::dates::require_date;
use super::{require_text, InspectionDraft, InspectionRecord, RecordFilter};
use crate::db::{inspection_repo, Database};
use crate::error::RecordError;
use crate::sanitize::redact_path;
use crate::storage::{existing, AttachmentStore, Upload};

const KIND: &str = "Inspection";

/// Inspections with at most one photo each.
///
/// The photo is written before the row so its path can be stored with the
/// row in one insert.
#[derive(Clone)]
pub struct InspectionRepository {
    db: Database,
    attachments: Arc<AttachmentStore>,
}

impl InspectionRepository {
    pub fn new(db: Database, attachments: Arc<AttachmentStore>) -> Self {
        Self { db, attachments }
    }

    pub fn create(
        &self,
        draft: &InspectionDraft,
        photo: Option<&Upload>,
    ) -> Result<i64, RecordError> {
        let _span = info_span!("inspections.create").entered();
        validate(draft)?;

        let photo_path = photo
            .map(|upload| self.attachments.store_single(upload))
            .transpose()?;
        let photo_str = photo_path.as_ref().map(|p| p.to_string_lossy().into_owned());

        match inspection_repo::insert(&self.db, draft, photo_str.as_deref()) {
            Ok(id) => {
                info!(id, has_photo = photo_path.is_some(), "Inspection created");
                Ok(id)
            }
            Err(e) => {
                if let Some(path) = photo_path {
                    self.discard_photo(&path);
                }
                Err(e.into())
            }
        }
    }

    pub fn read(&self, id: i64) -> Result<Option<InspectionRecord>, RecordError> {
        Ok(inspection_repo::find_by_id(&self.db, id)?)
    }

    pub fn list(&self, filter: &RecordFilter) -> Result<Vec<InspectionRecord>, RecordError> {
        Ok(inspection_repo::query(&self.db, filter)?)
    }

    /// Replaces every form field of an existing inspection. The photo stays.
    pub fn update(&self, id: i64, draft: &InspectionDraft) -> Result<(), RecordError> {
        validate(draft)?;
        match inspection_repo::update(&self.db, id, draft)? {
            0 => Err(RecordError::NotFound { kind: KIND, id }),
            _ => {
                info!(id, "Inspection updated");
                Ok(())
            }
        }
    }

    /// Attaches a photo to an existing inspection, replacing (and removing)
    /// any previous one.
    pub fn attach_photo(&self, id: i64, upload: &Upload) -> Result<PathBuf, RecordError> {
        let record = self
            .read(id)?
            .ok_or(RecordError::NotFound { kind: KIND, id })?;

        let path = self.attachments.store_single(upload)?;
        if let Err(e) =
            inspection_repo::set_photo_path(&self.db, id, Some(&path.to_string_lossy()))
        {
            self.discard_photo(&path);
            return Err(e.into());
        }

        if let Some(previous) = record.photo_path {
            self.discard_photo(Path::new(&previous));
        }
        Ok(path)
    }

    /// The record's photo if it still exists on disk.
    pub fn photo(&self, id: i64) -> Result<Option<PathBuf>, RecordError> {
        Ok(self
            .read(id)?
            .and_then(|r| r.photo_path)
            .and_then(|p| existing(Path::new(&p))))
    }

    /// Deletes the photo file first, then the row.
    pub fn delete(&self, id: i64) -> Result<(), RecordError> {
        let _span = info_span!("inspections.delete", id).entered();
        let record = self
            .read(id)?
            .ok_or(RecordError::NotFound { kind: KIND, id })?;

        if let Some(path) = record.photo_path {
            self.discard_photo(Path::new(&path));
        }
        inspection_repo::delete(&self.db, id)?;
        info!(id, "Inspection deleted");
        Ok(())
    }

    fn discard_photo(&self, path: &Path) {
        if let Err(e) = self.attachments.remove_single(path) {
            warn!(file = %redact_path(path), error = %e, "Failed to remove inspection photo");
        }
    }
}

fn validate(draft: &InspectionDraft) -> Result<(), RecordError> {
    require_date("inspection_date", &draft.inspection_date)?;
    require_date("elimination_date", &draft.elimination_date)?;
    require_text("organization", &draft.organization)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, InspectionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = Arc::new(AttachmentStore::new(db.clone(), temp_dir.path().join("uploads")));
        (temp_dir, InspectionRepository::new(db, store))
    }

    fn draft(date: &str) -> InspectionDraft {
        InspectionDraft {
            inspection_date: date.to_string(),
            object: "Стан 2000".to_string(),
            organization: "ООО Монтаж".to_string(),
            violation_description: "Нет ограждения".to_string(),
            elimination_date: date.to_string(),
            elimination_status: "не устранено".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_with_photo_and_read_back() {
        let (_tmp, repo) = setup();
        let upload = Upload::new("fence.png", b"png".to_vec());
        let id = repo.create(&draft("01.03.2024"), Some(&upload)).unwrap();

        let record = repo.read(id).unwrap().unwrap();
        assert_eq!(record.fields.inspection_date, "01.03.2024");
        let photo = repo.photo(id).unwrap().unwrap();
        assert_eq!(std::fs::read(photo).unwrap(), b"png");
    }

    #[test]
    fn test_create_rejects_bad_date() {
        let (_tmp, repo) = setup();
        let err = repo.create(&draft("2024-03-01"), None).unwrap_err();
        assert!(matches!(err, RecordError::Validation { field: "inspection_date", .. }));
        assert!(repo.list(&RecordFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let (_tmp, repo) = setup();
        let err = repo.update(42, &draft("01.03.2024")).unwrap_err();
        assert!(matches!(err, RecordError::NotFound { id: 42, .. }));
    }

    #[test]
    fn test_update_replaces_fields() {
        let (_tmp, repo) = setup();
        let id = repo.create(&draft("01.03.2024"), None).unwrap();

        let mut changed = draft("02.03.2024");
        changed.elimination_status = "устранено".to_string();
        repo.update(id, &changed).unwrap();

        assert_eq!(repo.read(id).unwrap().unwrap().fields, changed);
    }

    #[test]
    fn test_attach_photo_replaces_previous_file() {
        let (_tmp, repo) = setup();
        let id = repo
            .create(&draft("01.03.2024"), Some(&Upload::new("a.jpg", b"a".to_vec())))
            .unwrap();
        let first = repo.photo(id).unwrap().unwrap();

        let second = repo.attach_photo(id, &Upload::new("b.jpg", b"b".to_vec())).unwrap();

        assert!(!first.exists());
        assert_eq!(repo.photo(id).unwrap(), Some(second));
    }

    #[test]
    fn test_vanished_photo_reads_as_none() {
        let (_tmp, repo) = setup();
        let id = repo
            .create(&draft("01.03.2024"), Some(&Upload::new("a.jpg", b"a".to_vec())))
            .unwrap();
        std::fs::remove_file(repo.photo(id).unwrap().unwrap()).unwrap();

        assert_eq!(repo.photo(id).unwrap(), None);
        assert!(repo.read(id).unwrap().unwrap().photo_path.is_some());
    }

    #[test]
    fn test_delete_removes_photo_and_row() {
        let (_tmp, repo) = setup();
        let id = repo
            .create(&draft("01.03.2024"), Some(&Upload::new("a.jpg", b"a".to_vec())))
            .unwrap();
        let photo = repo.photo(id).unwrap().unwrap();

        repo.delete(id).unwrap();

        assert!(!photo.exists());
        assert!(repo.read(id).unwrap().is_none());
        assert!(matches!(repo.delete(id), Err(RecordError::NotFound { .. })));
    }
}
