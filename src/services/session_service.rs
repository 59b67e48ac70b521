//! services/session_service.rs
//! Persistencia de sesiones (SQLite) y de sus archivos (disco).

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};

use crate::errors::StudioError;
use crate::models::{category_model::Category, session_model::StudioSession};

const SESSION_COLUMNS: &str = "id, product_file, tags, detected_category, chosen_category, \
     previews, selected_preview, final_image, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct SessionService {
    db_pool: Pool<Sqlite>,
    sessions_dir: Arc<PathBuf>,
}

impl SessionService {
    pub fn new(db_pool: Pool<Sqlite>, data_dir: &Path) -> Self {
        SessionService {
            db_pool,
            sessions_dir: Arc::new(data_dir.join("sessions")),
        }
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.sessions_dir.join(session_id)
    }

    /// Escribe un archivo dentro del directorio de la sesión.
    pub async fn write_file(&self, session_id: &str, name: &str, data: &[u8]) -> Result<PathBuf> {
        let dir = self.session_dir(session_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("No se pudo crear {:?}", dir))?;

        let path = dir.join(name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Error escribiendo {:?}", path))?;

        log::debug!("Archivo guardado en {:?} ({} bytes)", path, data.len());
        Ok(path)
    }

    pub async fn read_file(&self, session_id: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.session_dir(session_id).join(name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Error leyendo {:?}", path))
    }

    pub async fn file_exists(&self, session_id: &str, name: &str) -> bool {
        let path = self.session_dir(session_id).join(name);
        tokio::fs::try_exists(&path).await.unwrap_or(false)
    }

    /// Sólo resuelve archivos que pertenecen a la sesión.
    pub fn resolve_file(&self, session: &StudioSession, name: &str) -> Result<PathBuf> {
        let known = name == session.product_file
            || session.previews.iter().any(|p| p == name)
            || session.final_image.as_deref() == Some(name);

        if !known {
            return Err(StudioError::NotFound(format!("image '{}'", name)).into());
        }
        Ok(self.session_dir(&session.id).join(name))
    }

    pub async fn insert_session(&self, session: &StudioSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, product_file, tags, detected_category, chosen_category,
                previews, selected_preview, final_image, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&session.id)
        .bind(&session.product_file)
        .bind(serde_json::to_string(&session.tags)?)
        .bind(session.detected_category.as_str())
        .bind(session.chosen_category.as_str())
        .bind(serde_json::to_string(&session.previews)?)
        .bind(session.selected_preview.map(|i| i as i64))
        .bind(&session.final_image)
        .bind(format_timestamp(&session.created_at))
        .bind(format_timestamp(&session.updated_at))
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar sesión")?;

        Ok(())
    }

    /// Persiste los campos mutables y refresca `updated_at`.
    pub async fn save_session(&self, session: &mut StudioSession) -> Result<()> {
        session.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET tags = ?2,
                chosen_category = ?3,
                previews = ?4,
                selected_preview = ?5,
                final_image = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&session.id)
        .bind(serde_json::to_string(&session.tags)?)
        .bind(session.chosen_category.as_str())
        .bind(serde_json::to_string(&session.previews)?)
        .bind(session.selected_preview.map(|i| i as i64))
        .bind(&session.final_image)
        .bind(format_timestamp(&session.updated_at))
        .execute(&self.db_pool)
        .await
        .context("Fallo al actualizar sesión")?;

        if result.rows_affected() == 0 {
            return Err(StudioError::NotFound(format!("session '{}'", session.id)).into());
        }
        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<StudioSession> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM sessions WHERE id = ?1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al consultar sesión")?
        .ok_or_else(|| StudioError::NotFound(format!("session '{}'", session_id)))?;

        session_from_row(&row)
    }

    /// Lista sesiones con paginación, más recientes primero
    pub async fn list_sessions(&self, page: u64, page_size: u64) -> Result<(u64, Vec<StudioSession>)> {
        let offset = (page.max(1) - 1) * page_size;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS cnt FROM sessions")
            .fetch_one(&self.db_pool)
            .await?
            .try_get("cnt")?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM sessions ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            SESSION_COLUMNS
        ))
        .bind(page_size as i64)
        .bind(offset as i64)
        .fetch_all(&self.db_pool)
        .await?;

        let items = rows
            .iter()
            .map(session_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok((total as u64, items))
    }
}

fn session_from_row(row: &SqliteRow) -> Result<StudioSession> {
    let tags: String = row.try_get("tags")?;
    let previews: String = row.try_get("previews")?;
    let detected: String = row.try_get("detected_category")?;
    let chosen: String = row.try_get("chosen_category")?;
    let selected: Option<i64> = row.try_get("selected_preview")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(StudioSession {
        id: row.try_get("id")?,
        product_file: row.try_get("product_file")?,
        tags: serde_json::from_str(&tags).context("tags corruptos en DB")?,
        detected_category: detected.parse::<Category>()?,
        chosen_category: chosen.parse::<Category>()?,
        previews: serde_json::from_str(&previews).context("previews corruptas en DB")?,
        selected_preview: selected.map(|i| i as usize),
        final_image: row.try_get("final_image")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Ancho fijo para que ORDER BY sobre el texto respete el orden cronológico
pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Fecha inválida en DB: {}", raw))?
        .with_timezone(&Utc))
}
