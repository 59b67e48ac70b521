//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod category_model;
pub mod operation_model;
pub mod session_model;
