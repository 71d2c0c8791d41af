//! Result sink
//!
//! Append-only storage for the raw responses of successful creations.

use crate::error::SinkError;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Destination for successful creation responses
pub trait ResultSink: Send + Sync {
    /// Append one response
    fn persist(&self, response: &Value) -> Result<(), SinkError>;

    /// Where responses end up, for log messages
    fn location(&self) -> String;
}

/// Appends pretty-printed responses to a file
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_err(&self, source: std::io::Error) -> SinkError {
        SinkError::Write {
            location: self.path.display().to_string(),
            source,
        }
    }
}

impl ResultSink for FileSink {
    fn persist(&self, response: &Value) -> Result<(), SinkError> {
        tracing::info!("Storing response to {}", self.path.display());

        let mut text = serde_json::to_string_pretty(response)?;
        text.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_err(e))?;

        file.write_all(text.as_bytes()).map_err(|e| self.write_err(e))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps responses in memory (dry runs, tests)
#[derive(Debug, Default)]
pub struct MemorySink {
    responses: Mutex<Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses persisted so far
    pub fn responses(&self) -> Vec<Value> {
        self.responses
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for MemorySink {
    fn persist(&self, response: &Value) -> Result<(), SinkError> {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push(response.clone());
        }
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_sink_appends() {
        let path = std::env::temp_dir()
            .join(format!("ftprov-sink-{}", uuid::Uuid::new_v4()))
            .join("connector_info.txt");
        let sink = FileSink::new(&path);

        sink.persist(&json!({"code": "Success", "data": {"id": "grp_1"}})).unwrap();
        sink.persist(&json!({"code": "Success", "data": {"id": "con_1"}})).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("grp_1"));
        assert!(content.contains("con_1"));
        assert!(content.find("grp_1").unwrap() < content.find("con_1").unwrap());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_file_sink_reports_write_errors() {
        let dir = std::env::temp_dir().join(format!("ftprov-sink-dir-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        // A directory cannot be opened for appending
        let sink = FileSink::new(&dir);
        let err = sink.persist(&json!({})).unwrap_err();
        assert!(matches!(err, SinkError::Write { .. }));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.persist(&json!(1)).unwrap();
        sink.persist(&json!(2)).unwrap();
        assert_eq!(sink.responses(), vec![json!(1), json!(2)]);
    }
}
