//! Process memory telemetry importer
//!
//! Metrics and events are append-only: each run queries the store for the
//! device's high-water timestamp and discards every parsed record that is
//! not strictly newer. Records are never updated or replaced.

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::store::DatalakeStore;

#[derive(Debug, Clone)]
pub struct MemoryMetric {
    pub pid: i64,
    pub session_id: Option<String>,
    pub rss_bytes: i64,
    pub rss_mb: f64,
    pub memory_rate_mb_min: Option<f64>,
    pub command: Option<String>,
    pub timestamp: String,
    pub timestamp_unix: i64,
}

#[derive(Debug, Clone)]
pub struct MemoryEvent {
    pub event_type: String,
    pub pid: Option<i64>,
    pub session_id: Option<String>,
    pub severity: String,
    pub message: Option<String>,
    pub details: Option<String>,
    pub timestamp: String,
    pub timestamp_unix: i64,
}

#[derive(Debug, Deserialize)]
struct MetricLine {
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    pid: i64,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    rss_bytes: i64,
    #[serde(default)]
    rss_mb: f64,
    #[serde(default)]
    rate_mb_min: Option<f64>,
    #[serde(default)]
    command: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventLine {
    #[serde(default)]
    timestamp: i64,
    #[serde(rename = "type", default)]
    event_type: Option<String>,
    #[serde(default)]
    pid: Option<i64>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

fn iso_from_unix(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Parse the metrics log, discarding records at or below the watermark.
pub fn parse_metrics(path: &Path, since_unix: i64) -> Result<Vec<MemoryMetric>> {
    if !path.exists() {
        warn!(path = %path.display(), "Metrics file not found");
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut metrics = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping unreadable metrics line");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let parsed: MetricLine = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping unparsable metrics line");
                continue;
            }
        };

        // Not strictly newer than the watermark means already ingested
        if parsed.timestamp <= since_unix {
            continue;
        }

        metrics.push(MemoryMetric {
            pid: parsed.pid,
            session_id: parsed.session_id,
            rss_bytes: parsed.rss_bytes,
            rss_mb: parsed.rss_mb,
            memory_rate_mb_min: parsed.rate_mb_min,
            command: parsed.command,
            timestamp: iso_from_unix(parsed.timestamp),
            timestamp_unix: parsed.timestamp,
        });
    }

    Ok(metrics)
}

/// Parse the events log with the same watermark rule as metrics.
pub fn parse_events(path: &Path, since_unix: i64) -> Result<Vec<MemoryEvent>> {
    if !path.exists() {
        warn!(path = %path.display(), "Events file not found");
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping unreadable events line");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let parsed: EventLine = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping unparsable events line");
                continue;
            }
        };

        if parsed.timestamp <= since_unix {
            continue;
        }

        // Structured details are stored as JSON text; strings pass through
        let details = parsed.details.map(|d| match d {
            Value::String(s) => s,
            other => other.to_string(),
        });

        events.push(MemoryEvent {
            event_type: parsed.event_type.unwrap_or_else(|| "unknown".to_string()),
            pid: parsed.pid,
            session_id: parsed.session_id,
            severity: parsed.severity.unwrap_or_else(|| "info".to_string()),
            message: parsed.message,
            details,
            timestamp: iso_from_unix(parsed.timestamp),
            timestamp_unix: parsed.timestamp,
        });
    }

    Ok(events)
}

// ============================================
// IMPORT
// ============================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryImportStats {
    pub metrics_ingested: usize,
    pub events_ingested: usize,
}

pub struct MemoryImporter<'a> {
    store: &'a DatalakeStore,
    log_dir: PathBuf,
    device: String,
}

impl<'a> MemoryImporter<'a> {
    pub fn new(store: &'a DatalakeStore, log_dir: impl Into<PathBuf>, device: impl Into<String>) -> Self {
        Self {
            store,
            log_dir: log_dir.into(),
            device: device.into(),
        }
    }

    pub fn run(&self) -> Result<MemoryImportStats> {
        let metric_watermark = self.store.last_metric_timestamp(&self.device)?;
        let event_watermark = self.store.last_event_timestamp(&self.device)?;
        info!(metric_watermark, event_watermark, "Incremental telemetry import");

        let metrics = parse_metrics(&self.log_dir.join("metrics.jsonl"), metric_watermark)?;
        let events = parse_events(&self.log_dir.join("events.jsonl"), event_watermark)?;

        let tx = self.store.begin()?;
        for metric in &metrics {
            self.store.insert_metric(metric, &self.device)?;
        }
        for event in &events {
            self.store.insert_event(event, &self.device)?;
        }
        tx.commit()?;

        info!(metrics = metrics.len(), events = events.len(), "Ingested telemetry");
        Ok(MemoryImportStats {
            metrics_ingested: metrics.len(),
            events_ingested: events.len(),
        })
    }
}
