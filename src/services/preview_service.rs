//! services/preview_service.rs
//! Previews de modelo con el Space de Stable Diffusion: una llamada por vista.

use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use futures::future::join_all;
use serde_json::{json, Value};

use crate::errors::StudioError;
use crate::models::category_model::{Category, Gender};
use crate::services::gradio_client::{FileRef, GradioClient};
use crate::services::prompt_service::{build_prompts, view_for};

pub const DEFAULT_PREVIEWS: usize = 3;
pub const MAX_PREVIEWS: usize = 6;

#[derive(Clone)]
pub struct PreviewService {
    client: GradioClient,
    api_name: Arc<String>,
    guidance_scale: f64,
}

impl PreviewService {
    pub fn new(client: GradioClient, api_name: &str, guidance_scale: f64) -> Self {
        Self {
            client,
            api_name: Arc::new(api_name.to_string()),
            guidance_scale,
        }
    }

    /// Genera `count` previews. Las que fallan se omiten; devuelve `(índice, png)`
    /// en orden, o error si no salió ninguna.
    pub async fn generate(
        &self,
        tags: &[String],
        category: Category,
        count: usize,
        gender: Gender,
    ) -> Result<Vec<(usize, Bytes)>> {
        log::info!(
            "(generate_previews) {} previews para categoría '{}'",
            count,
            category
        );

        let jobs = (0..count).map(|i| self.generate_one(tags, category, i, gender));
        let results = join_all(jobs).await;

        let mut previews = Vec::with_capacity(count);
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(image) => previews.push((index, image)),
                Err(e) => log::warn!("(generate_previews) Preview {} omitida: {:#}", index, e),
            }
        }

        if previews.is_empty() {
            return Err(StudioError::Upstream("no model previews could be generated".to_string()).into());
        }
        Ok(previews)
    }

    async fn generate_one(
        &self,
        tags: &[String],
        category: Category,
        index: usize,
        gender: Gender,
    ) -> Result<Bytes> {
        let (positive, negative) = build_prompts(tags, category, Some(view_for(index)), gender);
        log::debug!("(generate_previews) Prompt {}: {}", index, positive);

        let outputs = self
            .client
            .predict(
                &self.api_name,
                vec![json!(positive), json!(negative), json!(self.guidance_scale)],
            )
            .await?;

        let file = first_gallery_image(&outputs)
            .ok_or_else(|| StudioError::Upstream(format!("preview {} returned no image", index)))?;
        self.client.download(&file).await
    }
}

/// Primera imagen de la galería de salida. El item puede ser `{image, caption}`
/// o directamente el archivo.
pub fn first_gallery_image(outputs: &[Value]) -> Option<FileRef> {
    let first = outputs.first()?;
    let item = match first {
        Value::Array(items) => items.first()?,
        other => other,
    };

    match item.get("image") {
        Some(image) => FileRef::from_value(image),
        None => FileRef::from_value(item),
    }
}
