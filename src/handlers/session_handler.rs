//! handlers/session_handler.rs
//! Endpoints del flujo de estudio (upload, categoría, previews, selección, try-on).

use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::errors::error_response;
use crate::models::{
    category_model::Category,
    operation_model::{OP_GENERATE_PREVIEWS, OP_TRYON},
    session_model::{
        GeneratePreviewsRequest, ListSessionsResponse, QueuedResponse, SelectPreviewRequest,
        SessionView, SetCategoryRequest, TryOnRequest, UploadProductRequest,
    },
};
use crate::services::{preview_service::DEFAULT_PREVIEWS, studio_service::StudioService};

#[derive(Deserialize)]
pub struct PaginationQuery {
    page: Option<u64>,
    page_size: Option<u64>,
}

/// POST /api/sessions
pub async fn upload_product_endpoint(
    studio: web::Data<StudioService>,
    body: web::Json<UploadProductRequest>,
) -> HttpResponse {
    let req = body.into_inner();
    log::info!(
        "Entrando a upload_product_endpoint: {} ({} bytes)",
        req.file_name,
        req.data.len()
    );

    match studio.analyze_upload(&req.file_name, &req.data).await {
        Ok(session) => HttpResponse::Ok().json(SessionView::from_session(&session)),
        Err(e) => error_response(&e),
    }
}

/// GET /api/sessions
pub async fn list_sessions_endpoint(
    studio: web::Data<StudioService>,
    query: web::Query<PaginationQuery>,
) -> HttpResponse {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(10).clamp(1, 100);

    match studio.sessions().list_sessions(page, page_size).await {
        Ok((total, sessions)) => HttpResponse::Ok().json(ListSessionsResponse {
            total,
            page,
            page_size,
            items: sessions.iter().map(SessionView::from_session).collect(),
        }),
        Err(e) => error_response(&e),
    }
}

/// GET /api/sessions/{id}
pub async fn get_session_endpoint(
    studio: web::Data<StudioService>,
    path: web::Path<String>,
) -> HttpResponse {
    let session_id = path.into_inner();

    match studio.sessions().get_session(&session_id).await {
        Ok(session) => HttpResponse::Ok().json(SessionView::from_session(&session)),
        Err(e) => error_response(&e),
    }
}

/// PUT /api/sessions/{id}/category
pub async fn set_category_endpoint(
    studio: web::Data<StudioService>,
    path: web::Path<String>,
    body: web::Json<SetCategoryRequest>,
) -> HttpResponse {
    let session_id = path.into_inner();

    let category = match body.category.parse::<Category>() {
        Ok(c) => c,
        Err(e) => return error_response(&anyhow::Error::from(e)),
    };

    match studio.set_category(&session_id, category).await {
        Ok(session) => HttpResponse::Ok().json(SessionView::from_session(&session)),
        Err(e) => error_response(&e),
    }
}

/// POST /api/sessions/{id}/previews
pub async fn generate_previews_endpoint(
    studio: web::Data<StudioService>,
    path: web::Path<String>,
    body: web::Json<GeneratePreviewsRequest>,
) -> HttpResponse {
    let session_id = path.into_inner();
    let req = body.into_inner();
    let count = req.num_options.unwrap_or(DEFAULT_PREVIEWS);
    let gender = req.gender.unwrap_or_default();

    // Validar antes de crear la operación
    if let Err(e) = studio.check_previews(&session_id, count).await {
        return error_response(&e);
    }

    let op_id = match studio
        .begin_operation(OP_GENERATE_PREVIEWS, &session_id, req.async_run)
        .await
    {
        Ok(id) => id,
        Err(e) => return error_response(&e.context("Operation creation failed")),
    };

    if req.async_run {
        let studio = studio.clone();
        let op_id_clone = op_id.clone();
        tokio::spawn(async move {
            let result = studio.generate_previews(&session_id, count, gender).await;
            studio.finish_operation(&op_id_clone, &result).await;
        });

        return HttpResponse::Accepted().json(QueuedResponse {
            success: true,
            operation_id: op_id,
            message: "Preview generation queued".to_string(),
        });
    }

    let result = studio.generate_previews(&session_id, count, gender).await;
    studio.finish_operation(&op_id, &result).await;
    match result {
        Ok(session) => HttpResponse::Ok().json(SessionView::from_session(&session)),
        Err(e) => error_response(&e),
    }
}

/// POST /api/sessions/{id}/selection
pub async fn select_preview_endpoint(
    studio: web::Data<StudioService>,
    path: web::Path<String>,
    body: web::Json<SelectPreviewRequest>,
) -> HttpResponse {
    let session_id = path.into_inner();

    match studio.select_preview(&session_id, body.index).await {
        Ok(session) => HttpResponse::Ok().json(SessionView::from_session(&session)),
        Err(e) => error_response(&e),
    }
}

/// POST /api/sessions/{id}/tryon
pub async fn tryon_endpoint(
    studio: web::Data<StudioService>,
    path: web::Path<String>,
    body: web::Json<TryOnRequest>,
) -> HttpResponse {
    let session_id = path.into_inner();
    let req = body.into_inner();

    // Categoría soportada y preview elegida, antes de encolar
    if let Err(e) = studio.check_tryon(&session_id).await {
        return error_response(&e);
    }

    let op_id = match studio
        .begin_operation(OP_TRYON, &session_id, req.async_run)
        .await
    {
        Ok(id) => id,
        Err(e) => return error_response(&e.context("Operation creation failed")),
    };

    if req.async_run {
        let studio = studio.clone();
        let op_id_clone = op_id.clone();
        tokio::spawn(async move {
            let result = studio.run_tryon(&session_id, req.steps, req.seed).await;
            studio.finish_operation(&op_id_clone, &result).await;
        });

        return HttpResponse::Accepted().json(QueuedResponse {
            success: true,
            operation_id: op_id,
            message: "Try-on queued".to_string(),
        });
    }

    let result = studio.run_tryon(&session_id, req.steps, req.seed).await;
    studio.finish_operation(&op_id, &result).await;
    match result {
        Ok(session) => HttpResponse::Ok().json(SessionView::from_session(&session)),
        Err(e) => error_response(&e),
    }
}

/// GET /api/sessions/{id}/images/{name}
/// Sólo sirve archivos registrados en la sesión.
pub async fn session_image_endpoint(
    req: HttpRequest,
    studio: web::Data<StudioService>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (session_id, name) = path.into_inner();

    let session = match studio.sessions().get_session(&session_id).await {
        Ok(s) => s,
        Err(e) => return error_response(&e),
    };
    let file_path = match studio.sessions().resolve_file(&session, &name) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    // Actix Files pone el Content-Type según la extensión
    match NamedFile::open_async(&file_path).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            log::warn!("No se pudo abrir {:?}: {}", file_path, e);
            HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": format!("image '{}' not found", name)
            }))
        }
    }
}
