use std::time::Instant;
use tracing::{debug, info, warn};

/// Guard around one traced operation. Records metadata while alive and
/// logs name, duration and outcome when dropped, so every exit path of a
/// retrieval is covered.
pub struct Span {
    name: &'static str,
    start: Instant,
    success: bool,
    error: Option<String>,
    metadata: Vec<(&'static str, String)>,
}

impl Span {
    pub fn start(name: &'static str) -> Self {
        debug!(span = name, "span started");
        Self { name, start: Instant::now(), success: true, error: None, metadata: Vec::new() }
    }

    pub fn add_metadata(&mut self, key: &'static str, value: impl ToString) {
        self.metadata.push((key, value.to_string()));
    }

    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.success = false;
        self.error = Some(err.to_string());
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        let duration_ms = self.elapsed_ms();
        let fields = self
            .metadata
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        if self.success {
            info!(span = self.name, duration_ms, %fields, "span ended");
        } else {
            let error = self.error.as_deref().unwrap_or("unknown");
            warn!(span = self.name, duration_ms, error, %fields, "span ended");
        }
    }
}
