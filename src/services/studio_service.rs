//! services/studio_service.rs
//! Orquesta el pipeline: upload -> tags -> categoría -> previews -> selección -> try-on.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::studio_config::StudioConfig;
use crate::errors::StudioError;
use crate::models::{
    category_model::{Category, Gender},
    operation_model::CreateOperationRequest,
    session_model::StudioSession,
};
use crate::services::{
    classifier_service::ClassifierService,
    garment_service::{describe_garment, infer_category},
    gradio_client::GradioClient,
    operation_service::OperationService,
    preview_service::{PreviewService, MAX_PREVIEWS},
    session_service::SessionService,
    tryon_service::{preprocess_garment, TryOnService, RANDOM_SEED},
};

pub const PRODUCT_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const GARMENT_FILE: &str = "garment_clean.png";
pub const FINAL_FILE: &str = "final_tryon.png";

pub fn preview_file(index: usize) -> String {
    format!("base_model_{}.png", index)
}

#[derive(Clone)]
pub struct StudioService {
    sessions: SessionService,
    operations: OperationService,
    classifier: ClassifierService,
    previews: PreviewService,
    tryon: TryOnService,
    default_steps: u32,
}

impl StudioService {
    pub fn new(
        sessions: SessionService,
        operations: OperationService,
        classifier: ClassifierService,
        previews: PreviewService,
        tryon: TryOnService,
        default_steps: u32,
    ) -> Self {
        Self {
            sessions,
            operations,
            classifier,
            previews,
            tryon,
            default_steps,
        }
    }

    /// Arma todos los servicios a partir de la config.
    pub fn from_config(config: &StudioConfig, db_pool: Pool<Sqlite>) -> Result<Self> {
        // Un solo semáforo para todos los jobs remotos
        let jobs = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        let preview_client = GradioClient::new(&config.preview_space_url, config, jobs.clone())?;
        let tryon_client = GradioClient::new(&config.tryon_space_url, config, jobs)?;

        Ok(Self::new(
            SessionService::new(db_pool.clone(), &config.data_dir),
            OperationService::new(db_pool),
            ClassifierService::new(config)?,
            PreviewService::new(preview_client, &config.preview_api, config.guidance_scale),
            TryOnService::new(tryon_client, &config.tryon_api),
            config.tryon_steps,
        ))
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    pub fn operations(&self) -> &OperationService {
        &self.operations
    }

    /// Guarda el producto, lo etiqueta y detecta la categoría.
    pub async fn analyze_upload(&self, file_name: &str, data: &[u8]) -> Result<StudioSession> {
        if data.is_empty() {
            return Err(StudioError::BadRequest("uploaded image is empty".to_string()).into());
        }
        let ext = product_extension(file_name)?;

        let session_id = Uuid::new_v4().to_string();
        let product_file = format!("product.{}", ext);
        self.sessions
            .write_file(&session_id, &product_file, data)
            .await?;

        // Si el clasificador falla seguimos sin tags
        let tags = match self.classifier.classify(data).await {
            Ok(tags) => tags,
            Err(e) => {
                log::warn!("(analyze_upload) Clasificación fallida, sin tags: {:#}", e);
                Vec::new()
            }
        };
        let detected = infer_category(&tags);
        log::info!(
            "(analyze_upload) Sesión {} -> categoría detectada '{}'",
            session_id,
            detected
        );

        let now = Utc::now();
        let session = StudioSession {
            id: session_id,
            product_file,
            tags,
            detected_category: detected,
            chosen_category: detected,
            previews: Vec::new(),
            selected_preview: None,
            final_image: None,
            created_at: now,
            updated_at: now,
        };
        self.sessions.insert_session(&session).await?;
        Ok(session)
    }

    pub async fn set_category(&self, session_id: &str, category: Category) -> Result<StudioSession> {
        let mut session = self.sessions.get_session(session_id).await?;
        if session.chosen_category != category {
            log::info!(
                "(set_category) Sesión {}: '{}' -> '{}'",
                session_id,
                session.chosen_category,
                category
            );
            session.chosen_category = category;
            // el try-on anterior ya no corresponde a la categoría elegida
            session.final_image = None;
            self.sessions.save_session(&mut session).await?;
        }
        Ok(session)
    }

    /// Valida la petición antes de encolar trabajo.
    pub async fn check_previews(&self, session_id: &str, count: usize) -> Result<StudioSession> {
        if count == 0 || count > MAX_PREVIEWS {
            return Err(StudioError::BadRequest(format!(
                "num_options must be between 1 and {}",
                MAX_PREVIEWS
            ))
            .into());
        }
        self.sessions.get_session(session_id).await
    }

    /// Regenera previews para la categoría elegida; limpia selección e imagen final.
    pub async fn generate_previews(
        &self,
        session_id: &str,
        count: usize,
        gender: Gender,
    ) -> Result<StudioSession> {
        let mut session = self.check_previews(session_id, count).await?;

        let generated = self
            .previews
            .generate(&session.tags, session.chosen_category, count, gender)
            .await?;

        let mut files = Vec::with_capacity(generated.len());
        for (index, image) in generated {
            let name = preview_file(index);
            self.sessions.write_file(&session.id, &name, &image).await?;
            files.push(name);
        }

        log::info!(
            "(generate_previews) Sesión {}: {} previews guardadas",
            session.id,
            files.len()
        );
        session.previews = files;
        session.selected_preview = None;
        session.final_image = None;
        self.sessions.save_session(&mut session).await?;
        Ok(session)
    }

    pub async fn select_preview(&self, session_id: &str, index: usize) -> Result<StudioSession> {
        let mut session = self.sessions.get_session(session_id).await?;
        if index >= session.previews.len() {
            return Err(StudioError::BadRequest(format!(
                "preview index {} out of range ({} previews)",
                index,
                session.previews.len()
            ))
            .into());
        }

        session.selected_preview = Some(index);
        self.sessions.save_session(&mut session).await?;
        Ok(session)
    }

    /// Valida que la sesión pueda pasar al try-on.
    pub async fn check_tryon(&self, session_id: &str) -> Result<StudioSession> {
        let session = self.sessions.get_session(session_id).await?;
        if !session.chosen_category.is_tryon_supported() {
            return Err(StudioError::TryOnUnsupported(session.chosen_category.to_string()).into());
        }
        if session.selected_preview_file().is_none() {
            return Err(StudioError::BadRequest("select a model preview first".to_string()).into());
        }
        Ok(session)
    }

    pub async fn run_tryon(
        &self,
        session_id: &str,
        steps: Option<u32>,
        seed: Option<i64>,
    ) -> Result<StudioSession> {
        let mut session = self.check_tryon(session_id).await?;
        let steps = steps.unwrap_or(self.default_steps);
        let seed = seed.unwrap_or(RANDOM_SEED);
        let description = describe_garment(&session.tags);

        let person = self.resolve_person(&session).await?;
        let person_png = self.sessions.read_file(&session.id, &person).await?;

        let product = self
            .sessions
            .read_file(&session.id, &session.product_file)
            .await?;
        let garment_png = preprocess_garment(&product)?;
        self.sessions
            .write_file(&session.id, GARMENT_FILE, &garment_png)
            .await?;

        let final_image = self
            .tryon
            .composite(
                person_png,
                garment_png,
                &description,
                session.chosen_category,
                steps,
                seed,
            )
            .await
            .context("Failed to generate the final try-on")?;

        self.sessions
            .write_file(&session.id, FINAL_FILE, &final_image)
            .await?;
        session.final_image = Some(FINAL_FILE.to_string());
        self.sessions.save_session(&mut session).await?;

        log::info!("(run_tryon) Sesión {}: try-on listo", session.id);
        Ok(session)
    }

    /// Preview elegida; si su archivo desapareció, la primera que siga en disco.
    pub(crate) async fn resolve_person(&self, session: &StudioSession) -> Result<String> {
        if let Some(selected) = session.selected_preview_file() {
            if self.sessions.file_exists(&session.id, selected).await {
                return Ok(selected.to_string());
            }
            log::warn!(
                "(resolve_person) {} no existe en disco, buscando otra preview",
                selected
            );
        }

        for name in &session.previews {
            if self.sessions.file_exists(&session.id, name).await {
                return Ok(name.clone());
            }
        }

        Err(StudioError::NotFound("model preview image".to_string()).into())
    }

    /// Crea la operación y la deja en "running".
    pub async fn begin_operation(
        &self,
        operation_type: &str,
        session_id: &str,
        is_async: bool,
    ) -> Result<String> {
        let created = self
            .operations
            .create_operation(CreateOperationRequest {
                operation_type: operation_type.to_string(),
                is_async,
                metadata: Some(serde_json::json!({ "session_id": session_id }).to_string()),
            })
            .await?;

        self.operations
            .update_operation_status(&created.id, "running", None)
            .await?;
        Ok(created.id)
    }

    /// Cierra la operación según el resultado.
    pub async fn finish_operation<T>(&self, op_id: &str, result: &Result<T>) {
        let outcome = match result {
            Ok(_) => {
                self.operations
                    .update_operation_status(op_id, "done", None)
                    .await
            }
            Err(e) => {
                self.operations
                    .mark_operation_failed(op_id, format!("{:#}", e))
                    .await
            }
        };

        if let Err(e) = outcome {
            log::error!("No se pudo cerrar la operación {}: {:#}", op_id, e);
        }
    }
}

fn product_extension(file_name: &str) -> Result<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if PRODUCT_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(StudioError::BadRequest(format!(
            "unsupported file type '{}': upload a PNG or JPG image",
            file_name
        ))
        .into())
    }
}
