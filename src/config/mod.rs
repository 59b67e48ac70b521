//! config/mod.rs
pub mod studio_config;
