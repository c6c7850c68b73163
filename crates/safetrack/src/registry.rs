//! The organization list ("Список ПО").
//!
//! Names are unique by exact, case-sensitive match. Records reference an
//! organization by its name as plain text, so renaming or deleting one
//! never touches existing records.

use tracing::info;

use crate::db::{organization_repo, Database};
use crate::error::RegistryError;

#[derive(Clone)]
pub struct OrganizationRegistry {
    db: Database,
}

impl OrganizationRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Adds an organization. A name that already exists is rejected.
    pub fn add(&self, name: &str) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        match organization_repo::insert(&self.db, name) {
            Ok(_) => {
                info!(organization = %name, "Organization added");
                Ok(())
            }
            Err(e) if e.is_unique_violation() => Err(RegistryError::Duplicate(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// All organization names, sorted.
    pub fn names(&self) -> Result<Vec<String>, RegistryError> {
        Ok(organization_repo::list_names(&self.db)?)
    }

    /// One page of names (1-based page numbers), for paginated editing.
    pub fn page(&self, page_number: usize, per_page: usize) -> Result<Vec<String>, RegistryError> {
        let start = page_number.saturating_sub(1).saturating_mul(per_page);
        Ok(self
            .names()?
            .into_iter()
            .skip(start)
            .take(per_page)
            .collect())
    }

    /// Renames `old_name` to `new_name`. The new name must be non-empty,
    /// different from the old one and not taken.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<(), RegistryError> {
        if old_name.trim().is_empty() || new_name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if old_name == new_name {
            return Err(RegistryError::Unchanged);
        }
        if organization_repo::exists(&self.db, new_name)? {
            return Err(RegistryError::Duplicate(new_name.to_string()));
        }

        match organization_repo::rename(&self.db, old_name, new_name) {
            Ok(0) => Err(RegistryError::NotFound(old_name.to_string())),
            Ok(_) => {
                info!(from = %old_name, to = %new_name, "Organization renamed");
                Ok(())
            }
            Err(e) if e.is_unique_violation() => {
                Err(RegistryError::Duplicate(new_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes an organization. Deleting an unknown name is a no-op.
    pub fn remove(&self, name: &str) -> Result<(), RegistryError> {
        let removed = organization_repo::delete(&self.db, name)?;
        if removed > 0 {
            info!(organization = %name, "Organization removed");
        }
        Ok(())
    }
}
