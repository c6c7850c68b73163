//! Photo attachments on disk and their index rows.
//!
//! Multi-photo records (site checks) keep their files in a per-record
//! namespace `<root>/<record_id>/` indexed by the `photos` table. Inspections
//! carry a single photo saved under a random name directly in `<root>`
//! before the record row exists.

use std::path::{Path, PathBuf};

use tracing::{debug, info_span, warn};

use crate::db::{photo_repo, Database};
use crate::error::StorageError;
use crate::sanitize::{extension_of, redact_path, sanitize_file_name};
use crate::storage::FileStorage;

/// An uploaded file as received from the form layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

pub struct AttachmentStore {
    db: Database,
    files: FileStorage,
}

impl AttachmentStore {
    pub fn new<P: AsRef<Path>>(db: Database, root: P) -> Self {
        Self {
            db,
            files: FileStorage::new(root),
        }
    }

    pub fn root(&self) -> &Path {
        self.files.root()
    }

    /// Writes `uploads` into the record's namespace and indexes them.
    ///
    /// Files with the same name get numbered instead of overwriting each
    /// other. Not transactional: if a later file fails, earlier ones stay
    /// written and indexed.
    pub fn store(&self, record_id: i64, uploads: &[Upload]) -> Result<Vec<PathBuf>, StorageError> {
        if uploads.is_empty() {
            return Ok(Vec::new());
        }

        let _span = info_span!("attachments.store", record_id, count = uploads.len()).entered();
        let namespace = record_id.to_string();
        let mut stored = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let filename = sanitize_file_name(&upload.name, "photo");
            let path = self.files.store(&upload.bytes, &namespace, &filename)?;
            let mime = mime_guess::from_path(&filename)
                .first()
                .map(|m| m.essence_str().to_string());

            if let Err(e) =
                photo_repo::insert(&self.db, record_id, &path.to_string_lossy(), mime.as_deref())
            {
                // Unindexed files would never be cleaned up.
                if let Err(remove_err) = self.files.remove_file(&path) {
                    warn!(file = %redact_path(&path), error = %remove_err, "Failed to remove unindexed photo");
                }
                self.files.remove_directory_if_empty(&namespace);
                return Err(e.into());
            }

            debug!(file = %redact_path(&path), "Stored photo");
            stored.push(path);
        }

        Ok(stored)
    }

    /// Paths indexed for a record, in the order they were stored.
    pub fn list_for(&self, record_id: i64) -> Result<Vec<PathBuf>, StorageError> {
        let paths = photo_repo::paths_for(&self.db, record_id)?;
        Ok(paths.into_iter().map(PathBuf::from).collect())
    }

    /// Removes every file of a record, its index rows and then the emptied
    /// namespace directory.
    ///
    /// Files that cannot be removed and a namespace that cannot be removed
    /// are logged and skipped: they are no longer reachable from any record.
    pub fn delete_for(&self, record_id: i64) -> Result<(), StorageError> {
        let _span = info_span!("attachments.delete", record_id).entered();

        for path in self.list_for(record_id)? {
            if let Err(e) = self.files.remove_file(&path) {
                warn!(file = %redact_path(&path), error = %e, "Failed to remove photo");
            }
        }

        let removed = photo_repo::delete_for_record(&self.db, record_id)?;
        debug!(removed, "Removed photo index rows");

        self.files.remove_directory_if_empty(&record_id.to_string());
        Ok(())
    }

    /// Saves a single photo under a fresh random name in the shared upload
    /// area. The original name only contributes its extension.
    pub fn store_single(&self, upload: &Upload) -> Result<PathBuf, StorageError> {
        let _span = info_span!("attachments.store_single").entered();

        let filename = match extension_of(&sanitize_file_name(&upload.name, "photo")) {
            Some(ext) => format!("{}.{}", uuid::Uuid::new_v4(), ext),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let path = self.files.store(&upload.bytes, "", &filename)?;
        debug!(file = %redact_path(&path), "Stored single photo");
        Ok(path)
    }

    /// Removes a photo saved with [`store_single`](Self::store_single).
    pub fn remove_single(&self, path: &Path) -> Result<(), StorageError> {
        self.files.remove_file(path)
    }
}

/// The path if the file still exists. A vanished file reads as "no photo".
pub fn existing(path: &Path) -> Option<PathBuf> {
    path.is_file().then(|| path.to_path_buf())
}

/// The subset of `paths` whose files still exist, order preserved.
pub fn existing_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter_map(|p| existing(p)).collect()
}
