use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;

use crate::config::studio_config::StudioConfig;
use crate::db::setup_database;
use crate::logger::init_logger;
use crate::services::studio_service::StudioService;

mod app;
mod config;
mod db;
mod errors;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let config = StudioConfig::from_env()?;
    log::info!(
        "Clasificador: {} | previews: {} | try-on: {}",
        config.inference_url,
        config.preview_space_url,
        config.tryon_space_url
    );

    // SQLite + migraciones
    let db_pool = setup_database(&config.data_dir).await?;

    let studio = StudioService::from_config(&config, db_pool)?;

    // Levantar servidor
    log::info!("Levantando servidor en {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Dms"))
            .app_data(web::Data::new(studio.clone()))
            .configure(app::init_app)
    })
    .workers(config.workers.max(1))
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
