//! config/studio_config.rs
//! Configuración global del servicio. Se lee una sola vez del entorno
//! (el `.env` ya cargado por `dotenv` en main).

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_CLASSIFIER_MODEL: &str = "google/vit-base-patch16-224";
pub const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_PREVIEW_SPACE: &str = "stabilityai/stable-diffusion";
pub const DEFAULT_PREVIEW_API: &str = "/infer";
pub const DEFAULT_TRYON_SPACE: &str = "jallenjia/Change-Clothes-AI";
pub const DEFAULT_TRYON_API: &str = "/tryon";
pub const DEFAULT_GRADIO_PREFIX: &str = "/gradio_api";

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub hf_api_token: String,
    pub classifier_model: String,
    /// Endpoint completo del modelo de clasificación
    pub inference_url: String,
    pub preview_space_url: String,
    pub preview_api: String,
    pub tryon_space_url: String,
    pub tryon_api: String,
    pub gradio_api_prefix: String,
    /// Raíz de `studio.db` y de los archivos de cada sesión
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub max_concurrent_jobs: usize,
    pub classify_timeout: Duration,
    pub job_timeout: Duration,
    pub guidance_scale: f64,
    pub tryon_steps: u32,
}

impl StudioConfig {
    pub fn from_env() -> Result<Self> {
        let hf_api_token = env::var("HF_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("Defina la variable HF_API_TOKEN en el entorno o en .env"))?;

        let classifier_model = var_or("HF_CLASSIFIER_MODEL", DEFAULT_CLASSIFIER_MODEL);
        let inference_url = env::var("HF_INFERENCE_URL")
            .unwrap_or_else(|_| format!("{}/{}", HF_INFERENCE_BASE, classifier_model));

        let preview_space = var_or("PREVIEW_SPACE", DEFAULT_PREVIEW_SPACE);
        let preview_space_url =
            env::var("PREVIEW_SPACE_URL").unwrap_or_else(|_| space_url(&preview_space));
        let tryon_space = var_or("TRYON_SPACE", DEFAULT_TRYON_SPACE);
        let tryon_space_url =
            env::var("TRYON_SPACE_URL").unwrap_or_else(|_| space_url(&tryon_space));

        Ok(Self {
            hf_api_token,
            classifier_model,
            inference_url,
            preview_space_url,
            preview_api: var_or("PREVIEW_API", DEFAULT_PREVIEW_API),
            tryon_space_url,
            tryon_api: var_or("TRYON_API", DEFAULT_TRYON_API),
            gradio_api_prefix: var_or("GRADIO_API_PREFIX", DEFAULT_GRADIO_PREFIX),
            data_dir: PathBuf::from(var_or("STUDIO_DATA_DIR", "data")),
            host: var_or("STUDIO_HOST", "0.0.0.0"),
            port: parse_var("STUDIO_PORT", 5022)?,
            workers: parse_var("STUDIO_WORKERS", 2)?,
            max_concurrent_jobs: parse_var("MAX_CONCURRENT_JOBS", 4)?,
            classify_timeout: Duration::from_secs(parse_var("CLASSIFY_TIMEOUT_SECS", 30)?),
            job_timeout: Duration::from_secs(parse_var("JOB_TIMEOUT_SECS", 300)?),
            guidance_scale: parse_var("GUIDANCE_SCALE", 9.0)?,
            tryon_steps: parse_var("TRYON_STEPS", 40)?,
        })
    }

    /// Config para tests: todos los servicios remotos apuntan a `base_url`.
    #[cfg(test)]
    pub fn test_new(base_url: &str, data_dir: PathBuf) -> Self {
        Self {
            hf_api_token: "test-token".to_string(),
            classifier_model: DEFAULT_CLASSIFIER_MODEL.to_string(),
            inference_url: format!("{}/models/classifier", base_url),
            preview_space_url: format!("{}/preview", base_url),
            preview_api: DEFAULT_PREVIEW_API.to_string(),
            tryon_space_url: format!("{}/tryon-space", base_url),
            tryon_api: DEFAULT_TRYON_API.to_string(),
            gradio_api_prefix: DEFAULT_GRADIO_PREFIX.to_string(),
            data_dir,
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
            max_concurrent_jobs: 4,
            classify_timeout: Duration::from_secs(5),
            job_timeout: Duration::from_secs(10),
            guidance_scale: 9.0,
            tryon_steps: 40,
        }
    }
}

/// URL pública de un Space de Hugging Face: `owner/name` -> `https://owner-name.hf.space`.
pub fn space_url(space: &str) -> String {
    let host: String = space
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, '/' | '_' | '.') { '-' } else { c })
        .collect();
    format!("https://{}.hf.space", host)
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Valor inválido para {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
