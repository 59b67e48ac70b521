//! handlers/ui_handler.rs
//! UI de una sola página y health check.

use actix_web::HttpResponse;
use serde_json::json;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET /
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// GET /api/health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
