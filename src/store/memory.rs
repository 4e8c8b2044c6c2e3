//! In-memory store — tests and demos.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StorageError;
use crate::form::model::{FormConfig, Lead};
use crate::store::{FormStore, LeadStore};

/// Shared in-memory backend for forms and leads.
#[derive(Default)]
pub struct MemoryStore {
    forms: RwLock<Vec<FormConfig>>,
    leads: RwLock<Vec<Lead>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormStore for MemoryStore {
    async fn resolve(&self, slug: &str) -> Result<Option<FormConfig>, StorageError> {
        let forms = self.forms.read().await;
        Ok(forms
            .iter()
            .find(|f| f.slug == slug && f.is_active())
            .cloned())
    }

    async fn get_form(&self, id: &str) -> Result<Option<FormConfig>, StorageError> {
        let forms = self.forms.read().await;
        Ok(forms.iter().find(|f| f.id == id).cloned())
    }

    async fn list_forms(&self) -> Result<Vec<FormConfig>, StorageError> {
        let mut forms = self.forms.read().await.clone();
        forms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(forms)
    }

    async fn save_form(&self, form: &FormConfig) -> Result<String, StorageError> {
        let mut forms = self.forms.write().await;
        if forms.iter().any(|f| f.slug == form.slug && f.id != form.id) {
            return Err(StorageError::Constraint(format!(
                "slug '{}' is already in use",
                form.slug
            )));
        }

        let mut form = form.clone();
        if form.id.is_empty() {
            form.id = Uuid::new_v4().to_string();
        }
        let id = form.id.clone();
        match forms.iter_mut().find(|f| f.id == form.id) {
            Some(existing) => *existing = form,
            None => forms.push(form),
        }
        Ok(id)
    }

    async fn delete_form(&self, id: &str) -> Result<(), StorageError> {
        let mut forms = self.forms.write().await;
        forms.retain(|f| f.id != id);
        Ok(())
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn save_lead(&self, lead: &Lead) -> Result<String, StorageError> {
        let mut leads = self.leads.write().await;
        leads.push(lead.clone());
        Ok(lead.id.clone())
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, StorageError> {
        let mut leads = self.leads.read().await.clone();
        leads.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(leads)
    }
}
