use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::errors::StudioError;
use crate::models::operation_model::{
    CreateOperationRequest, CreateOperationResponse, ListOperationsResponse, OperationRecord,
};
use crate::services::session_service::{format_timestamp, parse_timestamp};

const OPERATION_COLUMNS: &str =
    "id, operation_type, status, error_message, is_async, created_at, updated_at, metadata";

#[derive(Clone, Debug)]
pub struct OperationService {
    db_pool: Pool<Sqlite>,
}

impl OperationService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        OperationService { db_pool }
    }

    /// Crea la operación en DB con estado "pending"
    pub async fn create_operation(
        &self,
        req: CreateOperationRequest,
    ) -> Result<CreateOperationResponse> {
        let op_id = Uuid::new_v4().to_string();
        let now = format_timestamp(&Utc::now());

        sqlx::query(
            r#"
            INSERT INTO operations (
                id, operation_type, status, error_message,
                is_async, created_at, updated_at, metadata
            )
            VALUES (?1, ?2, 'pending', NULL, ?3, ?4, ?4, ?5)
            "#,
        )
        .bind(&op_id)
        .bind(&req.operation_type)
        .bind(req.is_async as i32)
        .bind(&now)
        .bind(&req.metadata)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar operation")?;

        log::info!(
            "Operación '{}' creada con id={}",
            req.operation_type,
            op_id
        );

        Ok(CreateOperationResponse {
            id: op_id,
            message: "Operation created".to_string(),
        })
    }

    /// Actualiza estado y error
    pub async fn update_operation_status(
        &self,
        op_id: &str,
        status: &str,
        error: Option<&str>,
    ) -> Result<()> {
        let now = format_timestamp(&Utc::now());
        sqlx::query(
            r#"
            UPDATE operations
            SET status = ?2,
                error_message = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(op_id)
        .bind(status)
        .bind(error)
        .bind(now)
        .execute(&self.db_pool)
        .await
        .context("Failed to update operation status")?;

        Ok(())
    }

    pub async fn mark_operation_failed(&self, op_id: &str, error: String) -> Result<()> {
        log::warn!("Operación {} marcada como fallida: {}", op_id, error);
        self.update_operation_status(op_id, "failed", Some(&error))
            .await
    }

    /// Obtiene la info de una operación
    pub async fn get_operation(&self, op_id: &str) -> Result<OperationRecord> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM operations WHERE id = ?1",
            OPERATION_COLUMNS
        ))
        .bind(op_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Fallo al consultar operación")?
        .ok_or_else(|| StudioError::NotFound(format!("operation '{}'", op_id)))?;

        operation_from_row(&row)
    }

    /// Lista operaciones con paginación
    pub async fn list_operations(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<ListOperationsResponse> {
        let page = page.max(1);
        let offset = (page - 1) * page_size;

        // total
        let total: i64 = sqlx::query("SELECT COUNT(*) AS cnt FROM operations")
            .fetch_one(&self.db_pool)
            .await?
            .try_get("cnt")?;

        // items
        let rows = sqlx::query(&format!(
            "SELECT {} FROM operations ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
            OPERATION_COLUMNS
        ))
        .bind(page_size as i64)
        .bind(offset as i64)
        .fetch_all(&self.db_pool)
        .await?;

        let items = rows
            .iter()
            .map(operation_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(ListOperationsResponse {
            total: total as u64,
            page,
            page_size,
            items,
        })
    }
}

fn operation_from_row(row: &SqliteRow) -> Result<OperationRecord> {
    let is_async: i64 = row.try_get("is_async")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    // parsea enteros a boolean e ISO8601
    Ok(OperationRecord {
        id: row.try_get("id")?,
        operation_type: row.try_get("operation_type")?,
        status: row.try_get("status")?,
        error_message: row.try_get("error_message")?,
        is_async: is_async != 0,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        metadata: row.try_get("metadata")?,
    })
}
