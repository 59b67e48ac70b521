//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers (sesiones, operaciones, UI).
pub mod operation_handler;
pub mod session_handler;
pub mod ui_handler;
