//! db.rs
//! Pool SQLite y migraciones.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

pub async fn setup_database(data_dir: &Path) -> Result<Pool<Sqlite>> {
    // 1) Crear carpeta de datos
    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("No se pudo crear directorio {:?}", data_dir))?;

    // 2) Ruta final: <data_dir>/studio.db
    let db_path = data_dir.join("studio.db");
    log::info!("Conectando a SQLite en {:?}", db_path);

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite")?;

    run_migrations(&db_pool).await?;
    Ok(db_pool)
}

/// Corre migraciones con sqlx
pub async fn run_migrations(db_pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(db_pool)
        .await
        .context("Fallo en migraciones")?;
    Ok(())
}
