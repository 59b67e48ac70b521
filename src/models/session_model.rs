//! models/session_model.rs
//! Sesión de estudio: lo que el usuario subió y lo que se generó a partir de ello.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::category_model::{Category, Gender};

/// Cantidad de tags que se muestran en la UI
pub const DISPLAY_TAGS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioSession {
    pub id: String,
    /// Nombre del archivo del producto dentro del directorio de la sesión
    pub product_file: String,
    pub tags: Vec<String>,
    pub detected_category: Category,
    pub chosen_category: Category,
    /// Nombres de archivo de las previews, en orden
    pub previews: Vec<String>,
    pub selected_preview: Option<usize>,
    pub final_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudioSession {
    pub fn image_url(&self, file_name: &str) -> String {
        format!("/api/sessions/{}/images/{}", self.id, file_name)
    }

    pub fn selected_preview_file(&self) -> Option<&str> {
        self.selected_preview
            .and_then(|i| self.previews.get(i))
            .map(String::as_str)
    }
}

/// POST /api/sessions
#[derive(Debug, Clone, Deserialize)]
pub struct UploadProductRequest {
    pub file_name: String,
    #[serde(deserialize_with = "deserialize_base64")]
    pub data: Vec<u8>,
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    // Aceptamos también data URLs ("data:image/png;base64,....")
    let payload = match s.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => s.as_str(),
    };
    base64::decode(payload.trim()).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetCategoryRequest {
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratePreviewsRequest {
    pub num_options: Option<usize>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub async_run: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectPreviewRequest {
    pub index: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TryOnRequest {
    pub steps: Option<u32>,
    /// -1 (por defecto) deja que el Space elija
    pub seed: Option<i64>,
    #[serde(default)]
    pub async_run: bool,
}

/// Vista de la sesión que consume la UI
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub product_image: String,
    pub tags: Vec<String>,
    pub display_tags: Vec<String>,
    pub detected_category: Category,
    pub chosen_category: Category,
    pub categories: Vec<Category>,
    pub tryon_supported: bool,
    pub previews: Vec<String>,
    pub selected_preview: Option<usize>,
    pub final_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionView {
    pub fn from_session(session: &StudioSession) -> Self {
        let warning = if session.chosen_category.is_tryon_supported() {
            None
        } else {
            Some(
                "Virtual try-on is unavailable for footwear/headwear. You can still generate previews."
                    .to_string(),
            )
        };

        Self {
            id: session.id.clone(),
            product_image: session.image_url(&session.product_file),
            tags: session.tags.clone(),
            display_tags: session.tags.iter().take(DISPLAY_TAGS).cloned().collect(),
            detected_category: session.detected_category,
            chosen_category: session.chosen_category,
            categories: Category::ALL.to_vec(),
            tryon_supported: session.chosen_category.is_tryon_supported(),
            previews: session.previews.iter().map(|p| session.image_url(p)).collect(),
            selected_preview: session.selected_preview,
            final_image: session.final_image.as_deref().map(|f| session.image_url(f)),
            warning,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSessionsResponse {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<SessionView>,
}

/// Respuesta de los endpoints cuando el trabajo queda en segundo plano
#[derive(Debug, Clone, Serialize)]
pub struct QueuedResponse {
    pub success: bool,
    pub operation_id: String,
    pub message: String,
}
