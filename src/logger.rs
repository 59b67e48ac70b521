//! logger.rs
//! Logger del servicio sobre env_logger.

/// Filtro por defecto: nuestro crate en `info`, el resto más silencioso.
const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn,reqwest=warn";

pub fn init_logger() {
    // RUST_LOG manda si está definida
    let log_env = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_env))
        .format_timestamp_secs()
        .format_module_path(false)
        .init();
}
