//! tests/mod.rs
//! Pruebas del servicio. Los servicios remotos (Hugging Face, Spaces de Gradio)
//! se simulan con mockito.

mod api_tests;
mod support;
