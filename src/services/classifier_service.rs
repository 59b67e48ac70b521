//! services/classifier_service.rs
//! Tagging del producto con el API de inferencia de Hugging Face.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::{header, Client};
use serde_json::Value;

use crate::config::studio_config::StudioConfig;
use crate::errors::StudioError;

/// Cantidad de etiquetas del clasificador que se consideran
pub const TOP_K: usize = 10;

#[derive(Clone)]
pub struct ClassifierService {
    http_client: Client,
    inference_url: Arc<String>,
    token: Arc<String>,
}

impl ClassifierService {
    pub fn new(config: &StudioConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.classify_timeout)
            .build()
            .context("No se pudo construir el cliente HTTP del clasificador")?;

        Ok(Self {
            http_client,
            inference_url: Arc::new(config.inference_url.clone()),
            token: Arc::new(config.hf_api_token.clone()),
        })
    }

    /// Envía la imagen cruda y devuelve tags en minúsculas, sin duplicados.
    pub async fn classify(&self, image: &[u8]) -> Result<Vec<String>> {
        log::info!(
            "(classify) Enviando {} bytes a {}",
            image.len(),
            self.inference_url
        );

        let resp = self
            .http_client
            .post(self.inference_url.as_str())
            .bearer_auth(self.token.as_str())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .context("(classify) Fallo al POST al clasificador")?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(StudioError::Upstream(format!(
                "classifier returned {}: {}",
                status, body_txt
            ))
            .into());
        }

        let data: Value = resp
            .json()
            .await
            .context("(classify) Respuesta del clasificador no es JSON")?;

        let tags = parse_labels(&data, TOP_K)?;
        log::info!("(classify) {} tags detectados: {:?}", tags.len(), tags);
        Ok(tags)
    }
}

/// Interpreta la respuesta del clasificador. Acepta una lista de `{label, score}`,
/// una lista de strings o un objeto con `labels`.
pub fn parse_labels(data: &Value, top_k: usize) -> Result<Vec<String>> {
    // `"error": null` (o vacío) no es un error
    let error = data
        .get("error")
        .filter(|e| !e.is_null() && e.as_str() != Some(""));
    if let Some(err) = error {
        let msg = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(anyhow!(StudioError::Upstream(format!("classifier error: {}", msg))));
    }

    let items = match data.get("labels").unwrap_or(data) {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    let mut tags: Vec<String> = Vec::new();
    for item in items.iter().take(top_k) {
        let label = match item {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => match obj.get("label").and_then(Value::as_str) {
                Some(label) => label,
                None => continue,
            },
            _ => continue,
        };

        for piece in explode_label(&label.to_lowercase()) {
            if !tags.contains(&piece) {
                tags.push(piece);
            }
        }
    }

    Ok(tags)
}

/// "jersey, T-shirt, tee shirt" -> ["jersey", "t-shirt", "tee shirt"]
fn explode_label(label: &str) -> Vec<String> {
    label
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
