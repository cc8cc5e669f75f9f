// Decision trace
// Append-only JSONL log with one record per finished scan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::acceptance::DetectionDecision;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// One line of the trace file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub decision: DetectionDecision,
}

impl TraceEntry {
    pub fn new(decision: DetectionDecision) -> Self {
        TraceEntry {
            timestamp: Utc::now(),
            decision,
        }
    }

    /// Serialize to a JSON line, newline included
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    /// Append one decision, creating the file on first use
    pub fn record(&self, decision: &DetectionDecision) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        let json_line = TraceEntry::new(decision.clone()).to_json_line()?;
        file.write_all(json_line.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read every entry of a trace file; blank lines are skipped
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: TraceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptance::{AcceptancePolicy, RejectReason};
    use crate::classifier::{ClassificationResult, Prediction};
    use crate::currency::DetectionMode;
    use tempfile::TempDir;

    fn rejected_decision() -> DetectionDecision {
        let result = ClassificationResult::new(vec![
            Prediction::new("NO BILLS", 0.9),
            Prediction::new("20 PESO", 0.1),
        ]);
        let verdict = AcceptancePolicy::default().evaluate(&result, DetectionMode::OldPeso);
        DetectionDecision::from_verdict(3, DetectionMode::OldPeso, &result, &verdict)
    }

    #[test]
    fn test_trace_writer_appends() {
        let temp_dir = TempDir::new().unwrap();
        let trace_path = temp_dir.path().join("decisions.jsonl");
        let writer = TraceWriter::new(trace_path.clone());

        writer.record(&rejected_decision()).unwrap();
        writer
            .record(&DetectionDecision::from_failure(4, DetectionMode::Usd, "camera busy"))
            .unwrap();

        let entries = read_trace_file(&trace_path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].decision.ticket, 3);
        assert_eq!(entries[0].decision.reject_reason, Some(RejectReason::NoObject));
        assert_eq!(entries[1].decision.failure.as_deref(), Some("camera busy"));
        assert!(entries[0].timestamp <= entries[1].timestamp);
    }

    #[test]
    fn test_json_line_is_flat() {
        let line = TraceEntry::new(rejected_decision()).to_json_line().unwrap();
        assert!(line.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["ticket"], 3);
        assert_eq!(value["mode"], "old_peso");
        assert_eq!(value["reject_reason"]["kind"], "no_object");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_missing_trace_file() {
        let result = read_trace_file(Path::new("/nonexistent/trace.jsonl"));
        assert!(matches!(result, Err(TraceError::IoError(_))));
    }
}
