//! services/gradio_sse.rs
//! Parser de Server-Sent Events para el stream de resultados de Gradio
//! (`GET /call/{api}/{event_id}`).
//!
//! - frames partidos entre chunks quedan en el buffer
//! - varios frames en un mismo chunk
//! - separadores `\n\n` y `\r\n\r\n`
//! - bytes UTF-8 cortados a mitad de carácter

use serde_json::Value;

/// Un frame SSE completo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Eventos que emite Gradio mientras corre un job
#[derive(Debug, Clone, PartialEq)]
pub enum GradioEvent {
    Generating,
    Heartbeat,
    /// Resultado final (`data` es la lista de salidas)
    Complete(Value),
    /// El job falló; Gradio a veces manda `null` como mensaje
    Error(Option<String>),
    Unknown(String),
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    pending_bytes: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alimenta bytes crudos de la red.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending_bytes.extend_from_slice(chunk);

        let text = match std::str::from_utf8(&self.pending_bytes) {
            Ok(text) => {
                let text = text.to_string();
                self.pending_bytes.clear();
                text
            }
            Err(e) if e.error_len().is_none() => {
                // carácter incompleto al final: guardamos la cola para el próximo chunk
                let valid = e.valid_up_to();
                let tail = self.pending_bytes.split_off(valid);
                let text = String::from_utf8_lossy(&self.pending_bytes).into_owned();
                self.pending_bytes = tail;
                text
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending_bytes).into_owned();
                self.pending_bytes.clear();
                text
            }
        };

        self.feed(&text)
    }

    /// Alimenta texto y devuelve todos los frames completos.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseFrame> {
        self.buffer.push_str(chunk);
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..pos + 2).collect();
            if let Some(frame) = Self::parse_block(&block) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Frame final que quedó sin línea en blanco al cerrar el stream.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        Self::parse_block(&rest)
    }

    fn parse_block(block: &str) -> Option<SseFrame> {
        let mut event = None;
        let mut data_lines: Vec<&str> = Vec::new();

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            if let Some(name) = line.strip_prefix("event:") {
                event = Some(name.trim().to_string());
            } else if let Some(data) = line.strip_prefix("data:") {
                data_lines.push(data.strip_prefix(' ').unwrap_or(data));
            }
        }

        if event.is_none() && data_lines.is_empty() {
            return None;
        }

        Some(SseFrame {
            event,
            data: data_lines.join("\n"),
        })
    }
}

impl GradioEvent {
    pub fn from_frame(frame: &SseFrame) -> Self {
        match frame.event.as_deref().unwrap_or("") {
            "generating" => GradioEvent::Generating,
            "heartbeat" => GradioEvent::Heartbeat,
            "complete" => match serde_json::from_str::<Value>(frame.data.trim()) {
                Ok(value) => GradioEvent::Complete(value),
                Err(e) => GradioEvent::Error(Some(format!("invalid complete payload: {}", e))),
            },
            "error" => GradioEvent::Error(error_message(&frame.data)),
            other => GradioEvent::Unknown(other.to_string()),
        }
    }
}

fn error_message(data: &str) -> Option<String> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Null) => None,
        Ok(Value::String(s)) => Some(s),
        Ok(Value::Object(obj)) => obj
            .get("error")
            .or_else(|| obj.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(Value::Object(obj.clone()).to_string())),
        Ok(other) => Some(other.to_string()),
        Err(_) => Some(data.to_string()),
    }
}
