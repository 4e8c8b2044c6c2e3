//! libSQL-backed store. Single local database file for forms and leads.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};

use crate::error::StorageError;
use crate::form::model::{ContactInfo, FormConfig, FormStatus, Lead, Theme};
use crate::store::{FormStore, LeadStore, migrations};

/// Store backed by a local libSQL database.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<Database>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a database file, creating parent directories as
    /// needed, and bring the schema up to date.
    pub async fn new_local(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Backend(format!("failed to create db dir: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Backend(format!("failed to open database: {e}")))?;
        Self::from_database(db).await
    }

    /// In-memory database for tests.
    pub async fn new_memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StorageError::Backend(format!("failed to open database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self, StorageError> {
        let conn = db
            .connect()
            .map_err(|e| StorageError::Backend(format!("failed to connect: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

// ── Row mapping ─────────────────────────────────────────────────────

fn status_to_str(status: FormStatus) -> &'static str {
    match status {
        FormStatus::Active => "active",
        FormStatus::Inactive => "inactive",
    }
}

fn status_from_str(s: &str) -> FormStatus {
    match s {
        "inactive" => FormStatus::Inactive,
        _ => FormStatus::Active,
    }
}

fn theme_to_str(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

fn theme_from_str(s: &str) -> Theme {
    match s {
        "dark" => Theme::Dark,
        _ => Theme::Light,
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| StorageError::Backend(format!("bad timestamp '{raw}': {e}")))
}

fn get_text(row: &libsql::Row, idx: i32) -> Result<String, StorageError> {
    row.get::<String>(idx)
        .map_err(|e| StorageError::Backend(e.to_string()))
}

fn get_opt_text(row: &libsql::Row, idx: i32) -> Result<Option<String>, StorageError> {
    // NULL surfaces as a get error in libsql, so a miss means absent.
    Ok(row.get::<String>(idx).ok())
}

fn row_to_form(row: &libsql::Row) -> Result<FormConfig, StorageError> {
    let questions = serde_json::from_str(&get_text(row, 6)?)
        .map_err(|e| StorageError::Serialization(format!("questions column: {e}")))?;
    let products = serde_json::from_str(&get_text(row, 8)?)
        .map_err(|e| StorageError::Serialization(format!("products column: {e}")))?;

    Ok(FormConfig {
        id: get_text(row, 0)?,
        name: get_text(row, 1)?,
        slug: get_text(row, 2)?,
        status: status_from_str(&get_text(row, 3)?),
        primary_color: get_text(row, 4)?,
        theme: theme_from_str(&get_text(row, 5)?),
        questions,
        ai_response_prompt: get_text(row, 7)?,
        products,
        expert_link: get_opt_text(row, 9)?,
        created_at: parse_timestamp(&get_text(row, 10)?)?,
    })
}

fn row_to_lead(row: &libsql::Row) -> Result<Lead, StorageError> {
    let answers = serde_json::from_str(&get_text(row, 3)?)
        .map_err(|e| StorageError::Serialization(format!("answers column: {e}")))?;

    Ok(Lead {
        id: get_text(row, 0)?,
        form_id: get_text(row, 1)?,
        form_name: get_text(row, 2)?,
        answers,
        ai_response: get_text(row, 4)?,
        contact_info: ContactInfo {
            name: get_text(row, 5)?,
            email: get_opt_text(row, 6)?,
            phone: get_opt_text(row, 7)?,
        },
        timestamp: parse_timestamp(&get_text(row, 8)?)?,
    })
}

const FORM_COLUMNS: &str = "id, name, slug, status, primary_color, theme, questions, \
                            ai_response_prompt, products, expert_link, created_at";
const LEAD_COLUMNS: &str = "id, form_id, form_name, answers, ai_response, contact_name, \
                            contact_email, contact_phone, timestamp";

fn map_backend_err(e: libsql::Error) -> StorageError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint failed") {
        StorageError::Constraint(message)
    } else {
        StorageError::Backend(message)
    }
}

#[async_trait]
impl FormStore for LibSqlBackend {
    async fn resolve(&self, slug: &str) -> Result<Option<FormConfig>, StorageError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {FORM_COLUMNS} FROM forms WHERE slug = ?1 AND status = 'active'"),
                params![slug],
            )
            .await
            .map_err(map_backend_err)?;

        match rows.next().await.map_err(map_backend_err)? {
            Some(row) => Ok(Some(row_to_form(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_form(&self, id: &str) -> Result<Option<FormConfig>, StorageError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {FORM_COLUMNS} FROM forms WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(map_backend_err)?;

        match rows.next().await.map_err(map_backend_err)? {
            Some(row) => Ok(Some(row_to_form(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_forms(&self) -> Result<Vec<FormConfig>, StorageError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {FORM_COLUMNS} FROM forms ORDER BY created_at DESC"),
                (),
            )
            .await
            .map_err(map_backend_err)?;

        let mut forms = Vec::new();
        while let Some(row) = rows.next().await.map_err(map_backend_err)? {
            forms.push(row_to_form(&row)?);
        }
        Ok(forms)
    }

    async fn save_form(&self, form: &FormConfig) -> Result<String, StorageError> {
        let id = if form.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            form.id.clone()
        };

        let questions = serde_json::to_string(&form.questions)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let products = serde_json::to_string(&form.products)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO forms (id, name, slug, status, primary_color, theme, questions, \
                 ai_response_prompt, products, expert_link, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
                 ON CONFLICT(id) DO UPDATE SET \
                 name = excluded.name, slug = excluded.slug, status = excluded.status, \
                 primary_color = excluded.primary_color, theme = excluded.theme, \
                 questions = excluded.questions, \
                 ai_response_prompt = excluded.ai_response_prompt, \
                 products = excluded.products, expert_link = excluded.expert_link",
                params![
                    id.clone(),
                    form.name.clone(),
                    form.slug.clone(),
                    status_to_str(form.status),
                    form.primary_color.clone(),
                    theme_to_str(form.theme),
                    questions,
                    form.ai_response_prompt.clone(),
                    products,
                    form.expert_link.clone(),
                    form.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(map_backend_err)?;

        Ok(id)
    }

    async fn delete_form(&self, id: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM forms WHERE id = ?1", params![id])
            .await
            .map_err(map_backend_err)?;
        Ok(())
    }
}

#[async_trait]
impl LeadStore for LibSqlBackend {
    async fn save_lead(&self, lead: &Lead) -> Result<String, StorageError> {
        let answers = serde_json::to_string(&lead.answers)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO leads (id, form_id, form_name, answers, ai_response, contact_name, \
                 contact_email, contact_phone, timestamp) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    lead.id.clone(),
                    lead.form_id.clone(),
                    lead.form_name.clone(),
                    answers,
                    lead.ai_response.clone(),
                    lead.contact_info.name.clone(),
                    lead.contact_info.email.clone(),
                    lead.contact_info.phone.clone(),
                    lead.timestamp.to_rfc3339(),
                ],
            )
            .await
            .map_err(map_backend_err)?;

        Ok(lead.id.clone())
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, StorageError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY timestamp DESC"),
                (),
            )
            .await
            .map_err(map_backend_err)?;

        let mut leads = Vec::new();
        while let Some(row) = rows.next().await.map_err(map_backend_err)? {
            leads.push(row_to_lead(&row)?);
        }
        Ok(leads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::model::{AnswerSet, Question, QuestionType};

    fn form(id: &str, slug: &str, status: FormStatus) -> FormConfig {
        FormConfig {
            id: id.into(),
            name: format!("Form {id}"),
            slug: slug.into(),
            status,
            primary_color: "#4F46E5".into(),
            theme: Theme::Dark,
            questions: vec![
                Question::new("q1", "Qual seu nome?", QuestionType::Text),
                Question::new("q2", "Faturamento", QuestionType::Select)
                    .with_options(vec!["Até 10k".into(), "Acima de 10k".into()]),
            ],
            ai_response_prompt: "Ajude o lead".into(),
            products: vec![],
            expert_link: Some("https://wa.me/5511999999999".into()),
            created_at: Utc::now(),
        }
    }

    fn lead(id: &str) -> Lead {
        let mut answers = AnswerSet::new();
        answers.insert("q1", "Jane");
        Lead {
            id: id.into(),
            form_id: "f1".into(),
            form_name: "Form f1".into(),
            answers,
            ai_response: "analysis".into(),
            contact_info: ContactInfo {
                name: "Jane".into(),
                email: Some("jane@example.com".into()),
                phone: None,
            },
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn form_round_trips_through_sqlite() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let original = form("f1", "alpha", FormStatus::Active);
        store.save_form(&original).await.unwrap();

        let loaded = store.get_form("f1").await.unwrap().unwrap();
        assert_eq!(loaded.name, original.name);
        assert_eq!(loaded.slug, "alpha");
        assert_eq!(loaded.theme, Theme::Dark);
        assert_eq!(loaded.questions.len(), 2);
        assert_eq!(loaded.questions[1].options, vec!["Até 10k", "Acima de 10k"]);
        assert_eq!(loaded.expert_link.as_deref(), Some("https://wa.me/5511999999999"));
    }

    #[tokio::test]
    async fn resolve_skips_inactive_forms() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        store.save_form(&form("f1", "alpha", FormStatus::Active)).await.unwrap();
        store.save_form(&form("f2", "beta", FormStatus::Inactive)).await.unwrap();

        assert!(store.resolve("alpha").await.unwrap().is_some());
        assert!(store.resolve("beta").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_slug_maps_to_constraint_error() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        store.save_form(&form("f1", "alpha", FormStatus::Active)).await.unwrap();

        let err = store
            .save_form(&form("f2", "alpha", FormStatus::Active))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn save_form_updates_in_place() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        store.save_form(&form("f1", "alpha", FormStatus::Active)).await.unwrap();

        let mut updated = form("f1", "alpha", FormStatus::Inactive);
        updated.name = "Renamed".into();
        store.save_form(&updated).await.unwrap();

        let loaded = store.get_form("f1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Renamed");
        assert_eq!(loaded.status, FormStatus::Inactive);
        assert_eq!(store.list_forms().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lead_round_trips_and_lists_newest_first() {
        let store = LibSqlBackend::new_memory().await.unwrap();
        let mut older = lead("l1");
        older.timestamp = Utc::now() - chrono::Duration::minutes(5);
        store.save_lead(&older).await.unwrap();
        store.save_lead(&lead("l2")).await.unwrap();

        let leads = store.list_leads().await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].id, "l2");
        assert_eq!(leads[1].contact_info.email.as_deref(), Some("jane@example.com"));
        assert_eq!(leads[1].answers.get("q1"), Some("Jane"));
    }

    #[tokio::test]
    async fn file_backed_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leadflow.db");

        {
            let store = LibSqlBackend::new_local(&path).await.unwrap();
            store.save_form(&form("f1", "alpha", FormStatus::Active)).await.unwrap();
        }

        let store = LibSqlBackend::new_local(&path).await.unwrap();
        assert!(store.resolve("alpha").await.unwrap().is_some());
    }
}
