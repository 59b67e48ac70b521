//! tests/support.rs
//! Helpers compartidos por las pruebas.

use std::{io::Cursor, path::Path};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::config::studio_config::StudioConfig;
use crate::db::run_migrations;
use crate::services::studio_service::StudioService;

/// SQLite en memoria: una sola conexión que nunca se recicla, si no la DB desaparece.
pub async fn memory_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");
    run_migrations(&pool).await.expect("Migrations failed");
    pool
}

pub async fn studio_for(server_url: &str, data_dir: &Path) -> StudioService {
    let config = StudioConfig::test_new(server_url, data_dir.to_path_buf());
    StudioService::from_config(&config, memory_pool().await).expect("Failed to build StudioService")
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])));
    encode(&img, ImageFormat::Png)
}

pub fn rgba_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([10, 120, 200, 128]),
    ));
    encode(&img, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 20, 20])));
    encode(&img, ImageFormat::Jpeg)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), format)
        .expect("Failed to encode test image");
    out
}

pub fn tags(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|t| t.to_string()).collect()
}
