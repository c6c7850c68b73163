use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, info_span, warn};

use super::dates::{require_date, require_time};
use super::{require_non_negative, require_text, CheckDraft, CheckListing, CheckRecord, RecordFilter};
use crate::catalog::kpb_detected;
use crate::db::{check_repo, Database};
use crate::error::RecordError;
use crate::storage::{AttachmentStore, Upload};

const KIND: &str = "Site check";

/// Site checks with any number of photos.
///
/// `kpb_detected` is derived here from the `kpb_violation` being written,
/// on every create and update. Callers cannot set it.
#[derive(Clone)]
pub struct CheckRepository {
    db: Database,
    attachments: Arc<AttachmentStore>,
}

impl CheckRepository {
    pub fn new(db: Database, attachments: Arc<AttachmentStore>) -> Self {
        Self { db, attachments }
    }

    /// Inserts the check, then stores its photos in the check's namespace.
    /// If storing the photos fails, the new check and whatever was stored
    /// are removed again before the error is returned.
    pub fn create(&self, draft: &CheckDraft, photos: &[Upload]) -> Result<i64, RecordError> {
        let _span = info_span!("checks.create", photos = photos.len()).entered();
        validate(draft)?;

        let id = check_repo::insert(&self.db, draft, kpb_detected(&draft.kpb_violation))?;
        if let Err(e) = self.attachments.store(id, photos) {
            warn!(id, error = %e, "Storing photos failed, rolling back check");
            self.attachments.delete_for(id)?;
            check_repo::delete(&self.db, id)?;
            return Err(e.into());
        }

        info!(id, "Site check created");
        Ok(id)
    }

    pub fn read(&self, id: i64) -> Result<Option<CheckRecord>, RecordError> {
        Ok(check_repo::find_by_id(&self.db, id)?)
    }

    /// One entry per check with its photo paths (possibly none).
    pub fn list(&self, filter: &RecordFilter) -> Result<Vec<CheckListing>, RecordError> {
        Ok(check_repo::query_with_photos(&self.db, filter)?)
    }

    /// Replaces the whole row of an existing check.
    pub fn update(&self, id: i64, draft: &CheckDraft) -> Result<(), RecordError> {
        validate(draft)?;
        let detected = kpb_detected(&draft.kpb_violation);
        match check_repo::update(&self.db, id, draft, detected)? {
            0 => Err(RecordError::NotFound { kind: KIND, id }),
            _ => {
                info!(id, kpb_detected = detected, "Site check updated");
                Ok(())
            }
        }
    }

    /// Adds photos to an existing check.
    pub fn attach_photos(&self, id: i64, photos: &[Upload]) -> Result<Vec<PathBuf>, RecordError> {
        self.ensure_exists(id)?;
        Ok(self.attachments.store(id, photos)?)
    }

    /// Photo paths of a check in the order they were stored.
    pub fn photos(&self, id: i64) -> Result<Vec<PathBuf>, RecordError> {
        Ok(self.attachments.list_for(id)?)
    }

    /// Removes all photos (files, index rows, namespace) and then the row.
    pub fn delete(&self, id: i64) -> Result<(), RecordError> {
        let _span = info_span!("checks.delete", id).entered();
        self.ensure_exists(id)?;

        self.attachments.delete_for(id)?;
        check_repo::delete(&self.db, id)?;
        info!(id, "Site check deleted");
        Ok(())
    }

    fn ensure_exists(&self, id: i64) -> Result<(), RecordError> {
        if check_repo::exists(&self.db, id)? {
            Ok(())
        } else {
            Err(RecordError::NotFound { kind: KIND, id })
        }
    }
}

fn validate(draft: &CheckDraft) -> Result<(), RecordError> {
    require_date("date", &draft.date)?;
    require_time("start_time", &draft.start_time)?;
    require_time("end_time", &draft.end_time)?;
    require_text("po_name", &draft.po_name)?;
    require_non_negative("works_count", draft.works_count)?;
    require_non_negative("personnel_count", draft.personnel_count)?;
    require_non_negative("checks_count", draft.checks_count)?;
    require_non_negative("violations_count", draft.violations_count)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{KPB_AFFIRMATIVE, KPB_NONE};
    use tempfile::TempDir;
    use walkdir::WalkDir;

    fn setup() -> (TempDir, CheckRepository) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = Arc::new(AttachmentStore::new(db.clone(), temp_dir.path().join("uploads")));
        (temp_dir, CheckRepository::new(db, store))
    }

    fn draft(kpb: &str) -> CheckDraft {
        CheckDraft {
            date: "01.03.2024".to_string(),
            po_name: "ООО Монтаж".to_string(),
            start_time: "08:00".to_string(),
            end_time: "17:00".to_string(),
            works_count: 1,
            personnel_count: 4,
            checks_count: 1,
            violations_count: 2,
            kpb_violation: kpb.to_string(),
            ..Default::default()
        }
    }

    fn photo_rows(repo: &CheckRepository) -> i64 {
        repo.db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?))
            .unwrap()
    }

    fn files_under(dir: &std::path::Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    #[test]
    fn test_kpb_detected_on_create() {
        let (_tmp, repo) = setup();
        for value in KPB_AFFIRMATIVE {
            let id = repo.create(&draft(value), &[]).unwrap();
            assert!(repo.read(id).unwrap().unwrap().kpb_detected, "{}", value);
        }
        let id = repo.create(&draft(KPB_NONE), &[]).unwrap();
        assert!(!repo.read(id).unwrap().unwrap().kpb_detected);
    }

    #[test]
    fn test_kpb_recomputed_from_saved_value_on_update() {
        let (_tmp, repo) = setup();
        let id = repo.create(&draft(KPB_NONE), &[]).unwrap();

        repo.update(id, &draft("Получи допуск")).unwrap();
        assert!(repo.read(id).unwrap().unwrap().kpb_detected);

        repo.update(id, &draft(KPB_NONE)).unwrap();
        assert!(!repo.read(id).unwrap().unwrap().kpb_detected);
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let (_tmp, repo) = setup();
        let err = repo.update(5, &draft(KPB_NONE)).unwrap_err();
        assert!(matches!(err, RecordError::NotFound { id: 5, .. }));
        assert!(repo.list(&RecordFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let (_tmp, repo) = setup();

        let mut bad = draft(KPB_NONE);
        bad.start_time = "8:00".to_string();
        assert!(matches!(
            repo.create(&bad, &[]),
            Err(RecordError::Validation { field: "start_time", .. })
        ));

        let mut bad = draft(KPB_NONE);
        bad.violations_count = -1;
        assert!(matches!(
            repo.create(&bad, &[]),
            Err(RecordError::Validation { field: "violations_count", .. })
        ));
    }

    #[test]
    fn test_create_with_photos_and_list() {
        let (_tmp, repo) = setup();
        let id = repo
            .create(
                &draft(KPB_NONE),
                &[Upload::new("a.jpg", b"a".to_vec()), Upload::new("a.jpg", b"b".to_vec())],
            )
            .unwrap();
        let bare = repo.create(&draft(KPB_NONE), &[]).unwrap();

        let listings = repo.list(&RecordFilter::default()).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].record.id, id);
        assert_eq!(listings[0].photo_paths.len(), 2);
        assert_eq!(listings[1].record.id, bare);
        assert!(listings[1].photo_paths.is_empty());
    }

    #[test]
    fn test_create_rolls_back_when_later_photo_fails() {
        let (tmp, repo) = setup();
        let too_long = format!("{}.jpg", "x".repeat(300));

        let result = repo.create(
            &draft(KPB_NONE),
            &[Upload::new("a.jpg", b"a".to_vec()), Upload::new(too_long, b"b".to_vec())],
        );

        assert!(matches!(result, Err(RecordError::Storage(_))));
        assert!(repo.list(&RecordFilter::default()).unwrap().is_empty());
        assert_eq!(photo_rows(&repo), 0);
        assert!(files_under(&tmp.path().join("uploads")).is_empty());
        assert!(!tmp.path().join("uploads").join("1").exists());
    }

    #[test]
    fn test_create_rolls_back_when_namespace_is_blocked() {
        let (tmp, repo) = setup();
        let uploads = tmp.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        let blocker = uploads.join("1");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = repo.create(&draft(KPB_NONE), &[Upload::new("a.jpg", b"a".to_vec())]);

        assert!(matches!(result, Err(RecordError::Storage(_))));
        assert!(repo.read(1).unwrap().is_none());
        assert!(repo.list(&RecordFilter::default()).unwrap().is_empty());
        assert_eq!(photo_rows(&repo), 0);
        assert_eq!(files_under(&uploads), vec![blocker]);
    }

    #[test]
    fn test_attach_photos_post_hoc() {
        let (_tmp, repo) = setup();
        let id = repo.create(&draft(KPB_NONE), &[]).unwrap();

        let paths = repo.attach_photos(id, &[Upload::new("late.png", b"x".to_vec())]).unwrap();
        assert_eq!(repo.photos(id).unwrap(), paths);

        assert!(matches!(
            repo.attach_photos(id + 1, &[Upload::new("x.png", b"x".to_vec())]),
            Err(RecordError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_cascades_to_photos() {
        let (_tmp, repo) = setup();
        let id = repo
            .create(&draft(KPB_NONE), &[Upload::new("a.jpg", b"a".to_vec())])
            .unwrap();
        let photos = repo.photos(id).unwrap();
        let namespace = photos[0].parent().unwrap().to_path_buf();

        repo.delete(id).unwrap();

        assert!(repo.read(id).unwrap().is_none());
        assert!(!photos[0].exists());
        assert!(!namespace.exists());
        assert!(repo.photos(id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (_tmp, repo) = setup();
        assert!(matches!(repo.delete(1), Err(RecordError::NotFound { .. })));
    }
}
