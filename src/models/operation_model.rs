use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const OP_GENERATE_PREVIEWS: &str = "generate_previews";
pub const OP_TRYON: &str = "tryon";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: String,
    pub operation_type: String,
    pub status: String, // "pending", "running", "done", "failed"
    pub error_message: Option<String>,
    pub is_async: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: Option<String>, // JSON adicional (session_id, etc.)
}

/// Request para crear una operación
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOperationRequest {
    // "generate_previews" o "tryon"
    pub operation_type: String,
    pub is_async: bool,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOperationResponse {
    pub id: String,
    pub message: String,
}

/// Para listar operaciones con paginación
#[derive(Debug, Clone, Serialize)]
pub struct ListOperationsResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<OperationRecord>,
}
