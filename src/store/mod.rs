//! Persistence layer — form resolution and append-only lead storage.

pub mod libsql_backend;
pub mod memory;
mod migrations;

pub use libsql_backend::LibSqlBackend;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::form::model::{FormConfig, Lead};

/// Backend-agnostic form storage.
///
/// `resolve` is the respondent-facing seam: it only returns active forms, so
/// a deactivated form behaves as not-found for respondents.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Resolve an active form by slug. At most one form matches.
    async fn resolve(&self, slug: &str) -> Result<Option<FormConfig>, StorageError>;

    /// Fetch a form by id regardless of status (authoring side).
    async fn get_form(&self, id: &str) -> Result<Option<FormConfig>, StorageError>;

    /// List all forms, newest first.
    async fn list_forms(&self) -> Result<Vec<FormConfig>, StorageError>;

    /// Insert or update a form. Slug uniqueness is enforced.
    async fn save_form(&self, form: &FormConfig) -> Result<String, StorageError>;

    /// Delete a form by id.
    async fn delete_form(&self, id: &str) -> Result<(), StorageError>;
}

/// Backend-agnostic lead storage. Append-only: no update or delete.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persist a lead. Returns its id.
    async fn save_lead(&self, lead: &Lead) -> Result<String, StorageError>;

    /// List all captured leads, newest first.
    async fn list_leads(&self) -> Result<Vec<Lead>, StorageError>;
}
