//! handlers/operation_handler.rs
//! Seguimiento de operaciones (previews y try-on, síncronas o en segundo plano).
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::errors::error_response;
use crate::services::studio_service::StudioService;

#[derive(Deserialize)]
pub struct PaginationQuery {
    page: Option<u64>,
    page_size: Option<u64>,
}

/// GET /api/operations
pub async fn list_operations_endpoint(
    studio: web::Data<StudioService>,
    query: web::Query<PaginationQuery>,
) -> HttpResponse {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(10).clamp(1, 100);

    match studio.operations().list_operations(page, page_size).await {
        Ok(list) => HttpResponse::Ok().json(list),
        Err(e) => error_response(&e),
    }
}

/// GET /api/operations/{id}
pub async fn get_operation_endpoint(
    studio: web::Data<StudioService>,
    path: web::Path<String>,
) -> HttpResponse {
    let op_id = path.into_inner();

    match studio.operations().get_operation(&op_id).await {
        Ok(op_record) => HttpResponse::Ok().json(op_record),
        Err(e) => error_response(&e),
    }
}
