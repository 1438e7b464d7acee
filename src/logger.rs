use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::diff::diff_json;

/// How fetched snapshots are written to the message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    Full,
    /// First snapshot per device in full, later ones as field changes.
    Diffed,
}

/// NDJSON record of traffic with the cloud service.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    snapshots: HashMap<String, Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            snapshots: HashMap::new(),
        })
    }

    pub fn log_request(&mut self, method: &str, endpoint: &str, query: &[(&str, String)]) {
        let query: serde_json::Map<String, Value> = query
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect();
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "endpoint": endpoint,
            "query": query,
        });
        self.write_line(&entry);
    }

    pub fn log_fetch(&mut self, device_id: &str, snapshot: &Value) {
        let previous = match self.mode {
            MessageLogMode::Full => None,
            MessageLogMode::Diffed => self.snapshots.get(device_id),
        };

        let entry = match previous {
            Some(prev) => {
                let mut changes = Vec::new();
                diff_json(prev, snapshot, "", &mut changes);
                let changes: Vec<Value> = changes
                    .into_iter()
                    .map(|c| json!({ "path": c.path, "old": c.old, "new": c.new }))
                    .collect();
                json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "fetch",
                    "device": device_id,
                    "changes": changes,
                })
            }
            None => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "fetch",
                "device": device_id,
                "full": true,
                "body": snapshot,
            }),
        };
        self.write_line(&entry);

        if self.mode == MessageLogMode::Diffed {
            self.snapshots.insert(device_id.to_string(), snapshot.clone());
        }
    }

    pub fn log_write(&mut self, device_id: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "write",
            "device": device_id,
            "body": body,
        });
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write message log entry: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn read_lines(path: &str) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn request_entry_carries_query() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_request("GET", "GetTStatInfoList", &[("GatewaySN", "WS1".to_string())]);

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "req");
        assert_eq!(lines[0]["method"], "GET");
        assert_eq!(lines[0]["query"]["GatewaySN"], "WS1");
        assert!(lines[0]["ts"].as_str().is_some());
    }

    #[test]
    fn diffed_mode_logs_full_then_changes_per_device() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        logger.log_fetch("WS1", &json!({"Indoor_Temp": 71}));
        logger.log_fetch("WS2", &json!({"Indoor_Temp": 65}));
        logger.log_fetch("WS1", &json!({"Indoor_Temp": 72}));

        let lines = read_lines(path);
        assert_eq!(lines[0]["full"], true);
        assert_eq!(lines[1]["full"], true);
        assert_eq!(lines[1]["device"], "WS2");
        let changes = lines[2]["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["path"], "Indoor_Temp");
        assert_eq!(changes[0]["new"], 72);
    }

    #[test]
    fn full_mode_always_logs_body() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();

        logger.log_fetch("WS1", &json!({"Indoor_Temp": 71}));
        logger.log_fetch("WS1", &json!({"Indoor_Temp": 71}));

        let lines = read_lines(path);
        assert_eq!(lines.len(), 2);
        assert!(lines[1]["body"].is_object());
    }

    #[test]
    fn write_entry_captures_device() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_write("WS1", &json!({"Heat_Set_Point": 63}));

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "write");
        assert_eq!(lines[0]["device"], "WS1");
        assert_eq!(lines[0]["body"]["Heat_Set_Point"], 63);
    }
}
