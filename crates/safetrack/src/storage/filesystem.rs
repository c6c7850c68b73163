use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Upper bound on numbered variants tried for one file name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Writes files below a root directory without ever overwriting one.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores `content` as `filename` inside `relative_directory` (may be
    /// empty for the root). Name clashes get a numbered suffix:
    /// `photo.jpg`, `photo_2.jpg`, `photo_3.jpg`, …
    pub fn store(
        &self,
        content: &[u8],
        relative_directory: &str,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir_path = self.root.join(relative_directory);
        self.ensure_directory(&dir_path)?;
        self.store_with_atomic_creation(&dir_path, filename, content)
    }

    /// Tries the original name, then numbered variants, creating each with
    /// `create_new` so a concurrent writer can never be clobbered.
    fn store_with_atomic_creation(
        &self,
        dir_path: &Path,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let (base, ext) = match filename.rfind('.') {
            Some(dot_pos) if dot_pos > 0 => (&filename[..dot_pos], Some(&filename[dot_pos..])),
            _ => (filename, None),
        };

        for counter in 1..=MAX_NAME_ATTEMPTS {
            let try_filename = if counter == 1 {
                filename.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{}_{}{}", base, counter, ext),
                    None => format!("{}_{}", base, counter),
                }
            };

            let try_path = dir_path.join(&try_filename);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: try_path.clone(),
                            source: e,
                        })?;
                    return Ok(try_path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(dir_path.join(filename)))
    }

    /// Removes a file. A file that is already gone counts as removed.
    pub fn remove_file(&self, path: &Path) -> Result<(), StorageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::RemoveFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Removes `relative_directory` if it is empty. Returns whether it was
    /// removed; any failure (not empty, missing, denied) yields `false`.
    pub fn remove_directory_if_empty(&self, relative_directory: &str) -> bool {
        let dir_path = self.root.join(relative_directory);
        match std::fs::remove_dir(&dir_path) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(
                    directory = %relative_directory,
                    error = %e,
                    "Leaving attachment directory in place"
                );
                false
            }
        }
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}
