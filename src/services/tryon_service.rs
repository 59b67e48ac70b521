//! services/tryon_service.rs
//! Preprocesado de la prenda y composición con el Space de try-on.

use std::{io::Cursor, sync::Arc};

use anyhow::{Context, Result};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde_json::{json, Value};

use crate::errors::StudioError;
use crate::models::category_model::Category;
use crate::services::gradio_client::{FileRef, GradioClient};

/// Lado máximo de la prenda que se manda al try-on
pub const GARMENT_MAX_SIDE: u32 = 768;
/// Semilla por defecto: el Space elige una al azar
pub const RANDOM_SEED: i64 = -1;

/// Decodifica, pasa a RGB y achica (nunca agranda) a 768x768 como máximo. Sale PNG.
pub fn preprocess_garment(data: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| StudioError::BadRequest(format!("unsupported product image: {}", e)))?;

    let mut rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let (width, height) = rgb.dimensions();
    if width > GARMENT_MAX_SIDE || height > GARMENT_MAX_SIDE {
        rgb = rgb.thumbnail(GARMENT_MAX_SIDE, GARMENT_MAX_SIDE);
    }

    let mut out = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .context("No se pudo codificar la prenda como PNG")?;

    log::info!(
        "(preprocess_garment) {}x{} -> {}x{} ({} bytes)",
        width,
        height,
        rgb.width(),
        rgb.height(),
        out.len()
    );
    Ok(out)
}

#[derive(Clone)]
pub struct TryOnService {
    client: GradioClient,
    api_name: Arc<String>,
}

impl TryOnService {
    pub fn new(client: GradioClient, api_name: &str) -> Self {
        Self {
            client,
            api_name: Arc::new(api_name.to_string()),
        }
    }

    /// Compone la prenda sobre la persona; devuelve la imagen final.
    pub async fn composite(
        &self,
        person_png: Vec<u8>,
        garment_png: Vec<u8>,
        description: &str,
        category: Category,
        steps: u32,
        seed: i64,
    ) -> Result<Bytes> {
        if !category.is_tryon_supported() {
            return Err(StudioError::TryOnUnsupported(category.to_string()).into());
        }

        // 1) Subir ambas imágenes
        let person = self.client.upload(person_png, "person.png").await?;
        let garment = self.client.upload(garment_png, "garment.png").await?;

        // 2) Correr el try-on (auto mask + auto crop)
        let inputs = tryon_inputs(&person, &garment, description, category, steps, seed);
        log::info!(
            "(tryon) Componiendo '{}' ({}) con {} pasos, seed={}",
            description,
            category,
            steps,
            seed
        );
        let outputs = self.client.predict(&self.api_name, inputs).await?;

        // 3) La primera salida es la imagen final; la segunda (máscara) no se usa
        let result = outputs
            .first()
            .and_then(FileRef::from_value)
            .ok_or_else(|| StudioError::Upstream("try-on returned an empty response".to_string()))?;

        self.client.download(&result).await
    }
}

/// Inputs posicionales del endpoint `/tryon`.
pub fn tryon_inputs(
    person: &FileRef,
    garment: &FileRef,
    description: &str,
    category: Category,
    steps: u32,
    seed: i64,
) -> Vec<Value> {
    vec![
        json!({
            "background": person.to_value(),
            "layers": [],
            "composite": null,
            "id": null
        }),
        garment.to_value(),
        json!(description),
        json!(true),
        json!(true),
        json!(steps as f64),
        json!(seed as f64),
        json!(category.as_str()),
    ]
}
