//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod classifier_service;
pub mod garment_service;
pub mod gradio_client;
pub mod gradio_sse;
pub mod operation_service;
pub mod preview_service;
pub mod prompt_service;
pub mod session_service;
pub mod studio_service;
pub mod tryon_service;
