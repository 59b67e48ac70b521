//! services/gradio_client.rs
//! Cliente HTTP para Spaces de Gradio (upload, call + stream SSE, download).

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::{
    multipart::{Form, Part},
    Client, Url,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{
    sync::{Semaphore, SemaphorePermit},
    time::timeout,
};

use crate::config::studio_config::StudioConfig;
use crate::errors::StudioError;
use crate::services::gradio_sse::{GradioEvent, SseParser};

/// Espera máxima por un lugar en el semáforo de jobs
const PERMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Referencia a un archivo del lado de Gradio (`gradio.FileData`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_name: Option<String>,
    #[serde(default)]
    pub meta: FileMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(rename = "_type")]
    pub kind: String,
}

impl Default for FileMeta {
    fn default() -> Self {
        Self {
            kind: "gradio.FileData".to_string(),
        }
    }
}

impl FileRef {
    pub fn from_path(path: String, orig_name: Option<String>) -> Self {
        Self {
            path,
            url: None,
            orig_name,
            meta: FileMeta::default(),
        }
    }

    /// Salidas viejas de Gradio pueden ser un string (ruta o URL) en vez de un objeto.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if s.starts_with("http://") || s.starts_with("https://") => {
                Some(Self {
                    url: Some(s.clone()),
                    ..Self::from_path(s.clone(), None)
                })
            }
            Value::String(s) if !s.is_empty() => Some(Self::from_path(s.clone(), None)),
            Value::Object(obj) if obj.contains_key("path") => {
                serde_json::from_value(value.clone()).ok()
            }
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Deserialize)]
struct EventIdResponse {
    event_id: String,
}

#[derive(Clone)]
pub struct GradioClient {
    http_client: Client,
    /// URL del Space + prefijo del API (p.e. `https://x.hf.space/gradio_api`)
    api_base: Arc<String>,
    token: Arc<String>,
    semaphore: Arc<Semaphore>,
    job_timeout: Duration,
}

impl GradioClient {
    pub fn new(space_url: &str, config: &StudioConfig, semaphore: Arc<Semaphore>) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("No se pudo construir el cliente HTTP de Gradio")?;

        let api_base = format!(
            "{}{}",
            space_url.trim_end_matches('/'),
            config.gradio_api_prefix.trim_end_matches('/')
        );

        Ok(Self {
            http_client,
            api_base: Arc::new(api_base),
            token: Arc::new(config.hf_api_token.clone()),
            semaphore,
            job_timeout: config.job_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Mismo host y puerto que el Space.
    fn is_space_url(&self, url: &str) -> bool {
        match (Url::parse(url), Url::parse(&self.api_base)) {
            (Ok(target), Ok(space)) => {
                target.host_str() == space.host_str()
                    && target.port_or_known_default() == space.port_or_known_default()
            }
            _ => false,
        }
    }

    /// Sube un archivo al Space; devuelve la referencia para usar como input.
    pub async fn upload(&self, data: Vec<u8>, file_name: &str) -> Result<FileRef> {
        let url = self.endpoint("/upload");
        log::info!("(gradio upload) {} ({} bytes) -> {}", file_name, data.len(), url);

        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .context("(gradio upload) mime inválido")?;
        let form = Form::new().part("files", part);

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(self.token.as_str())
            .multipart(form)
            .send()
            .await
            .context("(gradio upload) Fallo al POST")?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(StudioError::Upstream(format!("upload returned {}: {}", status, body_txt)).into());
        }

        let paths: Vec<String> = resp
            .json()
            .await
            .context("(gradio upload) Respuesta no es una lista de rutas")?;
        let path = paths
            .into_iter()
            .next()
            .ok_or_else(|| StudioError::Upstream("upload returned no paths".to_string()))?;

        Ok(FileRef::from_path(path, Some(file_name.to_string())))
    }

    /// Ejecuta `api_name` con los inputs posicionales y devuelve las salidas.
    pub async fn predict(&self, api_name: &str, data: Vec<Value>) -> Result<Vec<Value>> {
        let api = api_name.trim_start_matches('/');
        let _guard = self.acquire_permit().await?;

        match timeout(self.job_timeout, self.run_job(api, data)).await {
            Ok(result) => result,
            Err(_) => Err(StudioError::Upstream(format!(
                "job '{}' timed out after {}s",
                api,
                self.job_timeout.as_secs()
            ))
            .into()),
        }
    }

    async fn acquire_permit(&self) -> Result<SemaphorePermit<'_>> {
        timeout(PERMIT_TIMEOUT, self.semaphore.acquire())
            .await
            .context("Timeout esperando permiso para job de Gradio")?
            .map_err(|_| anyhow!("No se pudo adquirir el semaphore"))
    }

    async fn run_job(&self, api: &str, data: Vec<Value>) -> Result<Vec<Value>> {
        // 1) Encolar el job
        let call_url = self.endpoint(&format!("/call/{}", api));
        let resp = self
            .http_client
            .post(&call_url)
            .bearer_auth(self.token.as_str())
            .json(&json!({ "data": data }))
            .send()
            .await
            .with_context(|| format!("(gradio predict) Fallo al POST {}", call_url))?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(StudioError::Upstream(format!("{} returned {}: {}", api, status, body_txt)).into());
        }
        let EventIdResponse { event_id } = resp
            .json::<EventIdResponse>()
            .await
            .context("(gradio predict) Respuesta sin event_id")?;
        log::info!("(gradio predict) Job '{}' encolado, event_id={}", api, event_id);

        // 2) Leer el stream hasta "complete" o "error"
        let stream_url = format!("{}/{}", call_url, event_id);
        let resp = self
            .http_client
            .get(&stream_url)
            .bearer_auth(self.token.as_str())
            .send()
            .await
            .with_context(|| format!("(gradio predict) Fallo al GET {}", stream_url))?;

        let status = resp.status();
        if !status.is_success() {
            let body_txt = resp.text().await.unwrap_or_default();
            return Err(StudioError::Upstream(format!("{} stream returned {}: {}", api, status, body_txt)).into());
        }

        let mut parser = SseParser::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("(gradio predict) Error leyendo stream")?;
            for frame in parser.feed_bytes(&chunk) {
                if let Some(result) = Self::handle_event(api, GradioEvent::from_frame(&frame)) {
                    return result;
                }
            }
        }
        if let Some(frame) = parser.finish() {
            if let Some(result) = Self::handle_event(api, GradioEvent::from_frame(&frame)) {
                return result;
            }
        }

        Err(StudioError::Upstream(format!("{} stream ended without a result", api)).into())
    }

    /// `Some` cuando el evento termina el job.
    fn handle_event(api: &str, event: GradioEvent) -> Option<Result<Vec<Value>>> {
        match event {
            GradioEvent::Complete(Value::Array(outputs)) => {
                log::info!("(gradio predict) Job '{}' completo con {} salidas", api, outputs.len());
                Some(Ok(outputs))
            }
            GradioEvent::Complete(other) => Some(Ok(vec![other])),
            GradioEvent::Error(msg) => {
                let msg = msg.unwrap_or_else(|| "unknown error".to_string());
                log::warn!("(gradio predict) Job '{}' falló: {}", api, msg);
                Some(Err(StudioError::Upstream(format!("{}: {}", api, msg)).into()))
            }
            GradioEvent::Unknown(name) => {
                log::debug!("(gradio predict) Evento ignorado '{}'", name);
                None
            }
            GradioEvent::Generating | GradioEvent::Heartbeat => None,
        }
    }

    /// Descarga un archivo de salida.
    pub async fn download(&self, file: &FileRef) -> Result<Bytes> {
        let url = match &file.url {
            Some(url) => url.clone(),
            None => self.endpoint(&format!("/file={}", file.path)),
        };

        // El token sólo viaja al propio Space, no a URLs arbitrarias de la salida
        let mut request = self.http_client.get(&url);
        if self.is_space_url(&url) {
            request = request.bearer_auth(self.token.as_str());
        } else {
            log::debug!("(gradio download) {} fuera del Space, sin token", url);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("(gradio download) Fallo al GET {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StudioError::Upstream(format!("download of {} returned {}", url, status)).into());
        }

        let data = resp.bytes().await.context("(gradio download) Error leyendo bytes")?;
        log::info!("(gradio download) {} bytes desde {}", data.len(), url);
        Ok(data)
    }
}
