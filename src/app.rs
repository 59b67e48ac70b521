//! app.rs
use crate::handlers::{operation_handler, session_handler, ui_handler};
use actix_web::web;

/// Límite de los JSON (las imágenes viajan en base64)
pub const MAX_JSON_BYTES: usize = 25 * 1024 * 1024;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_JSON_BYTES))
        .route("/", web::get().to(ui_handler::index))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(ui_handler::health))
                .service(
                    web::scope("/sessions")
                        .route(
                            "",
                            web::post().to(session_handler::upload_product_endpoint),
                        )
                        .route("", web::get().to(session_handler::list_sessions_endpoint))
                        .route("/{id}", web::get().to(session_handler::get_session_endpoint))
                        .route(
                            "/{id}/category",
                            web::put().to(session_handler::set_category_endpoint),
                        )
                        .route(
                            "/{id}/previews",
                            web::post().to(session_handler::generate_previews_endpoint),
                        )
                        .route(
                            "/{id}/selection",
                            web::post().to(session_handler::select_preview_endpoint),
                        )
                        .route(
                            "/{id}/tryon",
                            web::post().to(session_handler::tryon_endpoint),
                        )
                        .route(
                            "/{id}/images/{name}",
                            web::get().to(session_handler::session_image_endpoint),
                        ),
                )
                .service(
                    web::scope("/operations")
                        .route(
                            "",
                            web::get().to(operation_handler::list_operations_endpoint),
                        )
                        .route(
                            "/{id}",
                            web::get().to(operation_handler::get_operation_endpoint),
                        ),
                ),
        );
}
