//! Claude Code session and history importer
//!
//! Reconstructs one session aggregate from a line-oriented JSONL event log:
//! each line is a self-contained event dispatched on its `type` field.
//! Corrupt lines (routinely present at the tail of an interrupted write) are
//! logged and skipped, never fatal.

use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::store::{DatalakeStore, Reconciliation};

#[derive(Debug, Clone)]
pub struct ClaudeMessage {
    pub message_uuid: String,
    pub parent_uuid: Option<String>,
    pub message_type: String,
    pub role: Option<String>,
    pub model: Option<String>,
    pub content_text: String,
    pub content_thinking: String,
    pub content_images: i64,
    pub content_tool_uses: i64,
    pub content_tool_results: i64,
    pub is_sidechain: bool,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub cache_read_tokens: i64,
    pub cache_creation_tokens: i64,
    pub stop_reason: Option<String>,
    pub request_id: Option<String>,
    pub timestamp: Option<String>,
    pub sequence_number: i64,
}

#[derive(Debug, Clone)]
pub struct ClaudeSession {
    pub session_id: String,
    pub project_path: String,
    pub project_encoded: String,
    pub summary: Option<String>,
    pub model_primary: Option<String>,
    pub claude_version: Option<String>,
    pub git_branch: Option<String>,
    pub total_messages: i64,
    pub user_messages: i64,
    pub assistant_messages: i64,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_cache_read_tokens: i64,
    pub total_cache_creation_tokens: i64,
    pub source_file: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub duration_seconds: Option<f64>,
    pub messages: Vec<ClaudeMessage>,
}

/// One prompt-history line from history.jsonl.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub session_id: String,
    pub display: String,
    pub pasted_contents: String,
    pub project: String,
    pub timestamp: Option<String>,
    pub timestamp_unix: i64,
}

/// Pointer to a subagent log belonging to a parent session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubagentRef {
    pub subagent_id: String,
    pub source_file: String,
}

// ============================================
// EVENT LOG WIRE FORMAT
// ============================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum SessionEvent {
    #[serde(rename = "summary")]
    Summary {
        #[serde(default)]
        summary: Option<String>,
    },
    #[serde(rename = "user")]
    User(TurnEvent),
    #[serde(rename = "assistant")]
    Assistant(TurnEvent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TurnEvent {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default, rename = "parentUuid")]
    parent_uuid: Option<String>,
    #[serde(default, rename = "isSidechain")]
    is_sidechain: bool,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default, rename = "gitBranch")]
    git_branch: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default, rename = "requestId")]
    request_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    message: InnerMessage,
}

#[derive(Debug, Default, Deserialize)]
struct InnerMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: ContentField,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

/// Content is either a bare string or a list of typed sub-items.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentField {
    Text(String),
    Items(Vec<ContentItem>),
}

impl Default for ContentField {
    fn default() -> Self {
        ContentField::Items(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentItem {
    Plain(String),
    Typed(TypedItem),
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TypedItem {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "thinking")]
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "tool_use")]
    ToolUse,
    #[serde(rename = "tool_result")]
    ToolResult,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: i64,
    #[serde(default)]
    output_tokens: i64,
    #[serde(default)]
    cache_read_input_tokens: i64,
    #[serde(default)]
    cache_creation_input_tokens: i64,
}

/// Per-message accumulators from one turn's content list.
#[derive(Debug, Default)]
struct ExtractedContent {
    text: String,
    thinking: String,
    images: i64,
    tool_uses: i64,
    tool_results: i64,
}

fn extract_content(content: &ContentField) -> ExtractedContent {
    let items = match content {
        ContentField::Text(s) => {
            return ExtractedContent {
                text: s.clone(),
                ..Default::default()
            }
        }
        ContentField::Items(items) => items,
    };

    let mut text_parts: Vec<&str> = Vec::new();
    let mut thinking_parts: Vec<&str> = Vec::new();
    let mut out = ExtractedContent::default();

    for item in items {
        match item {
            ContentItem::Plain(s) => text_parts.push(s),
            ContentItem::Typed(typed) => match typed {
                TypedItem::Text { text } => text_parts.push(text),
                TypedItem::Thinking { thinking } => thinking_parts.push(thinking),
                TypedItem::Image => out.images += 1,
                TypedItem::ToolUse => out.tool_uses += 1,
                TypedItem::ToolResult => out.tool_results += 1,
                TypedItem::Unknown => {}
            },
            ContentItem::Other(_) => {}
        }
    }

    out.text = text_parts.join("\n");
    out.thinking = thinking_parts.join("\n");
    out
}

// ============================================
// SESSION RECONSTRUCTION
// ============================================

/// Stream one session JSONL file into a session aggregate. Returns None when
/// no turn-type lines were found (summary-only logs are discarded).
pub fn parse_session_file(
    path: &Path,
    session_id: &str,
    project_encoded: &str,
) -> Result<Option<ClaudeSession>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut messages: Vec<ClaudeMessage> = Vec::new();
    let mut summaries: Vec<String> = Vec::new();
    let mut model_primary: Option<String> = None;
    let mut claude_version: Option<String> = None;
    let mut git_branch: Option<String> = None;
    let mut timestamps: Vec<String> = Vec::new();

    let mut totals = Usage::default();
    let mut user_count = 0i64;
    let mut assistant_count = 0i64;

    for (index, line) in reader.lines().enumerate() {
        let seq_num = (index + 1) as i64;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(line = seq_num, path = %path.display(), error = %e, "Skipping unreadable line");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event: SessionEvent = match serde_json::from_str(line.trim()) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = seq_num, path = %path.display(), error = %e, "Skipping unparsable line");
                continue;
            }
        };

        let (message_type, turn) = match event {
            SessionEvent::Summary { summary } => {
                if let Some(s) = summary {
                    summaries.push(s);
                }
                continue;
            }
            SessionEvent::User(turn) => ("user", turn),
            SessionEvent::Assistant(turn) => ("assistant", turn),
            SessionEvent::Other => continue,
        };

        if let Some(ts) = &turn.timestamp {
            timestamps.push(ts.clone());
        }
        if claude_version.is_none() {
            claude_version = turn.version.clone();
        }
        if git_branch.is_none() {
            git_branch = turn.git_branch.clone();
        }

        let content = extract_content(&turn.message.content);

        if model_primary.is_none() {
            model_primary = turn.message.model.clone().filter(|m| !m.is_empty());
        }

        let usage = turn.message.usage.unwrap_or_default();
        totals.input_tokens += usage.input_tokens;
        totals.output_tokens += usage.output_tokens;
        totals.cache_read_input_tokens += usage.cache_read_input_tokens;
        totals.cache_creation_input_tokens += usage.cache_creation_input_tokens;

        if message_type == "user" {
            user_count += 1;
        } else {
            assistant_count += 1;
        }

        messages.push(ClaudeMessage {
            message_uuid: turn.uuid.unwrap_or_default(),
            parent_uuid: turn.parent_uuid,
            message_type: message_type.to_string(),
            role: turn.message.role,
            model: turn.message.model,
            content_text: content.text,
            content_thinking: content.thinking,
            content_images: content.images,
            content_tool_uses: content.tool_uses,
            content_tool_results: content.tool_results,
            is_sidechain: turn.is_sidechain,
            cwd: turn.cwd,
            git_branch: turn.git_branch,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            cache_read_tokens: usage.cache_read_input_tokens,
            cache_creation_tokens: usage.cache_creation_input_tokens,
            stop_reason: turn.message.stop_reason,
            request_id: turn.request_id,
            timestamp: turn.timestamp,
            sequence_number: seq_num,
        });
    }

    if messages.is_empty() {
        return Ok(None);
    }

    // RFC 3339 timestamps from one writer sort lexicographically
    let started_at = timestamps.iter().min().cloned();
    let ended_at = timestamps.iter().max().cloned();
    let duration_seconds = duration_between(started_at.as_deref(), ended_at.as_deref());

    Ok(Some(ClaudeSession {
        session_id: session_id.to_string(),
        project_path: decode_project_path(project_encoded),
        project_encoded: project_encoded.to_string(),
        summary: summaries.into_iter().next(),
        model_primary,
        claude_version,
        git_branch,
        total_messages: messages.len() as i64,
        user_messages: user_count,
        assistant_messages: assistant_count,
        total_input_tokens: totals.input_tokens,
        total_output_tokens: totals.output_tokens,
        total_cache_read_tokens: totals.cache_read_input_tokens,
        total_cache_creation_tokens: totals.cache_creation_input_tokens,
        source_file: path.to_string_lossy().to_string(),
        started_at,
        ended_at,
        duration_seconds,
        messages,
    }))
}

/// Duration in seconds between two RFC 3339 timestamps; None when either is
/// absent or fails to parse (non-fatal).
fn duration_between(start: Option<&str>, end: Option<&str>) -> Option<f64> {
    let start = DateTime::parse_from_rfc3339(start?).ok()?;
    let end = DateTime::parse_from_rfc3339(end?).ok()?;
    Some((end - start).num_milliseconds() as f64 / 1000.0)
}

/// Project directories encode the path with '-' for '/'.
fn decode_project_path(encoded: &str) -> String {
    let decoded = encoded.replace('-', "/");
    if decoded.starts_with('/') {
        decoded
    } else {
        format!("/{}", decoded)
    }
}

// ============================================
// HISTORY LOG
// ============================================

/// Parse history.jsonl. Lines without a `display` field are not history
/// entries and are skipped silently; unparsable lines are logged and skipped.
pub fn parse_history(path: &Path) -> Result<Vec<HistoryEntry>> {
    if !path.exists() {
        warn!(path = %path.display(), "History file not found");
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping unreadable history line");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let data: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping unparsable history line");
                continue;
            }
        };

        let Some(display) = data.get("display").and_then(|v| v.as_str()) else {
            continue;
        };

        let timestamp_unix = data.get("timestamp").and_then(|v| v.as_i64()).unwrap_or(0);
        let timestamp = if timestamp_unix > 0 {
            DateTime::from_timestamp_millis(timestamp_unix)
                .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        } else {
            None
        };

        entries.push(HistoryEntry {
            session_id: data
                .get("sessionId")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            display: display.to_string(),
            pasted_contents: data
                .get("pastedContents")
                .map(|v| v.to_string())
                .unwrap_or_else(|| "{}".to_string()),
            project: data
                .get("project")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            timestamp,
            timestamp_unix,
        });
    }

    Ok(entries)
}

// ============================================
// DISCOVERY & IMPORT
// ============================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClaudeImportStats {
    pub history_entries: usize,
    pub sessions_new: usize,
    pub sessions_updated: usize,
    pub sessions_skipped: usize,
    pub messages_imported: usize,
    pub subagents: usize,
}

pub struct ClaudeImporter<'a> {
    store: &'a DatalakeStore,
    claude_dir: PathBuf,
    device: String,
}

impl<'a> ClaudeImporter<'a> {
    pub fn new(store: &'a DatalakeStore, claude_dir: impl Into<PathBuf>, device: impl Into<String>) -> Self {
        Self {
            store,
            claude_dir: claude_dir.into(),
            device: device.into(),
        }
    }

    pub fn run(&self) -> Result<ClaudeImportStats> {
        let mut stats = ClaudeImportStats::default();
        stats.history_entries = self.import_history()?;

        let projects_dir = self.claude_dir.join("projects");
        if !projects_dir.exists() {
            warn!(path = %projects_dir.display(), "Projects directory not found");
            return Ok(stats);
        }

        for project_entry in std::fs::read_dir(&projects_dir)? {
            let project_dir = project_entry?.path();
            if !project_dir.is_dir() {
                continue;
            }
            let project_encoded = project_dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            for file_entry in std::fs::read_dir(&project_dir)? {
                let file_path = file_entry?.path();
                let Some(name) = file_path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !file_path.is_file() || !is_session_filename(name) {
                    continue;
                }
                let session_id = name.trim_end_matches(".jsonl");
                let subagents = find_subagents(&project_dir, session_id)?;

                match self.import_session(&file_path, session_id, &project_encoded, &subagents)? {
                    Some((Reconciliation::Inserted(_), count)) => {
                        stats.sessions_new += 1;
                        stats.messages_imported += count;
                        stats.subagents += subagents.len();
                    }
                    Some((Reconciliation::Replaced(_), count)) => {
                        stats.sessions_updated += 1;
                        stats.messages_imported += count;
                        stats.subagents += subagents.len();
                    }
                    Some((Reconciliation::Skipped, _)) => stats.sessions_skipped += 1,
                    None => {}
                }
            }
        }

        info!(
            sessions_new = stats.sessions_new,
            sessions_updated = stats.sessions_updated,
            messages = stats.messages_imported,
            "Claude import finished"
        );
        Ok(stats)
    }

    /// One session file is one import unit: its session row, messages, and
    /// subagent pointers commit or roll back together.
    pub fn import_session(
        &self,
        path: &Path,
        session_id: &str,
        project_encoded: &str,
        subagents: &[SubagentRef],
    ) -> Result<Option<(Reconciliation, usize)>> {
        let Some(session) = parse_session_file(path, session_id, project_encoded)? else {
            return Ok(None);
        };

        let tx = self.store.begin()?;
        let outcome = self.store.reconcile_session(&session, &self.device)?;
        let count = match outcome {
            Reconciliation::Inserted(rowid) | Reconciliation::Replaced(rowid) => {
                let count = self.store.insert_session_messages(rowid, &session)?;
                for subagent in subagents {
                    self.store.insert_subagent(rowid, subagent)?;
                }
                count
            }
            Reconciliation::Skipped => 0,
        };
        tx.commit()?;

        Ok(Some((outcome, count)))
    }

    fn import_history(&self) -> Result<usize> {
        let entries = parse_history(&self.claude_dir.join("history.jsonl"))?;

        let tx = self.store.begin()?;
        let mut count = 0;
        for entry in &entries {
            if self.store.insert_history_entry(entry, &self.device)? {
                count += 1;
            }
        }
        tx.commit()?;

        info!(new = count, total = entries.len(), "Ingested history entries");
        Ok(count)
    }
}

/// Subagent logs live under a directory named after the parent session, as
/// `agent-*.jsonl`.
pub fn find_subagents(project_dir: &Path, session_id: &str) -> Result<Vec<SubagentRef>> {
    let subdir = project_dir.join(session_id);
    if !subdir.is_dir() {
        return Ok(Vec::new());
    }

    let mut refs = Vec::new();
    for entry in std::fs::read_dir(&subdir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !path.is_file() || !name.starts_with("agent-") || !name.ends_with(".jsonl") {
            continue;
        }
        refs.push(SubagentRef {
            subagent_id: name.trim_end_matches(".jsonl").to_string(),
            source_file: path.to_string_lossy().to_string(),
        });
    }
    refs.sort_by(|a, b| a.subagent_id.cmp(&b.subagent_id));
    Ok(refs)
}

/// Session logs are named `<uuid>.jsonl`.
fn is_session_filename(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".jsonl") else {
        return false;
    };
    if stem.len() != 36 {
        return false;
    }
    stem.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit() && !c.is_ascii_uppercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_session(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_reconstructs_session_totals() {
        let file = write_session(&[
            r#"{"type":"summary","summary":"First summary"}"#,
            r#"{"type":"user","uuid":"u1","timestamp":"2025-01-14T10:00:00Z","version":"1.0.2","gitBranch":"main","cwd":"/home/x","message":{"role":"user","content":"hello"}}"#,
            r#"{"type":"assistant","uuid":"a1","parentUuid":"u1","timestamp":"2025-01-14T10:00:30Z","message":{"role":"assistant","model":"claude-test","content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"hi"},{"type":"tool_use","name":"Bash","input":{}}],"usage":{"input_tokens":100,"output_tokens":20,"cache_read_input_tokens":5,"cache_creation_input_tokens":1}}}"#,
            r#"{"type":"summary","summary":"Second summary"}"#,
        ]);

        let session = parse_session_file(file.path(), "s1", "-home-x")
            .unwrap()
            .unwrap();

        assert_eq!(session.summary.as_deref(), Some("First summary"));
        assert_eq!(session.model_primary.as_deref(), Some("claude-test"));
        assert_eq!(session.claude_version.as_deref(), Some("1.0.2"));
        assert_eq!(session.git_branch.as_deref(), Some("main"));
        assert_eq!(session.project_path, "/home/x");
        assert_eq!(session.total_messages, 2);
        assert_eq!(session.user_messages, 1);
        assert_eq!(session.assistant_messages, 1);
        assert_eq!(session.total_input_tokens, 100);
        assert_eq!(session.total_output_tokens, 20);
        assert_eq!(session.duration_seconds, Some(30.0));

        // Sequence numbers are 1-based line numbers, not message indexes
        assert_eq!(session.messages[0].sequence_number, 2);
        assert_eq!(session.messages[1].sequence_number, 3);
        assert_eq!(session.messages[1].content_text, "hi");
        assert_eq!(session.messages[1].content_thinking, "hmm");
        assert_eq!(session.messages[1].content_tool_uses, 1);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let mut lines = Vec::new();
        let owned: Vec<String> = (0..10)
            .map(|i| {
                format!(
                    r#"{{"type":"user","uuid":"u{}","timestamp":"2025-01-14T10:00:0{}Z","message":{{"role":"user","content":"m{}"}}}}"#,
                    i, i, i
                )
            })
            .collect();
        lines.extend(owned.iter().map(|s| s.as_str()));
        lines.push("this is not json at all");

        let file = write_session(&lines);
        let session = parse_session_file(file.path(), "s1", "-p").unwrap().unwrap();
        assert_eq!(session.total_messages, 10);
    }

    #[test]
    fn test_summary_only_log_yields_nothing() {
        let file = write_session(&[r#"{"type":"summary","summary":"only a summary"}"#]);
        assert!(parse_session_file(file.path(), "s1", "-p").unwrap().is_none());
    }

    #[test]
    fn test_unknown_event_types_ignored() {
        let file = write_session(&[
            r#"{"type":"queue-operation","op":"enqueue"}"#,
            r#"{"type":"user","uuid":"u1","message":{"role":"user","content":"hi"}}"#,
        ]);
        let session = parse_session_file(file.path(), "s1", "-p").unwrap().unwrap();
        assert_eq!(session.total_messages, 1);
        assert!(session.duration_seconds.is_none());
    }

    #[test]
    fn test_history_parses_display_lines_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"display":"fix the bug","sessionId":"abc","project":"/home/x","timestamp":1736847600000,"pastedContents":{{}}}}"#
        )
        .unwrap();
        writeln!(file, r#"{{"somethingElse":true}}"#).unwrap();
        writeln!(file, "garbage line").unwrap();

        let entries = parse_history(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display, "fix the bug");
        assert_eq!(entries[0].timestamp_unix, 1736847600000);
        assert!(entries[0].timestamp.is_some());
    }

    #[test]
    fn test_non_utf8_line_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"type":"user","uuid":"u1","message":{"role":"user","content":"before"}}"#,
        )
        .unwrap();
        file.write_all(b"\n\xff\xfe torn write \xff\n").unwrap();
        file.write_all(
            br#"{"type":"user","uuid":"u2","message":{"role":"user","content":"after"}}"#,
        )
        .unwrap();
        file.write_all(b"\n").unwrap();

        let session = parse_session_file(file.path(), "s1", "-p").unwrap().unwrap();
        assert_eq!(session.total_messages, 2);
        assert_eq!(session.messages[1].content_text, "after");
    }

    #[test]
    fn test_find_subagents() {
        let dir = tempfile::tempdir().unwrap();
        let session_dir = dir.path().join("s1");
        std::fs::create_dir(&session_dir).unwrap();
        std::fs::write(session_dir.join("agent-b222.jsonl"), "").unwrap();
        std::fs::write(session_dir.join("agent-a111.jsonl"), "").unwrap();
        std::fs::write(session_dir.join("notes.txt"), "").unwrap();

        let refs = find_subagents(dir.path(), "s1").unwrap();
        let ids: Vec<&str> = refs.iter().map(|r| r.subagent_id.as_str()).collect();
        assert_eq!(ids, vec!["agent-a111", "agent-b222"]);

        assert!(find_subagents(dir.path(), "other").unwrap().is_empty());
    }

    #[test]
    fn test_session_filename_check() {
        assert!(is_session_filename(
            "0199b2b1-53f8-7452-8a5c-013a53821afe.jsonl"
        ));
        assert!(!is_session_filename("agent-0199b2b1.jsonl"));
        assert!(!is_session_filename("history.jsonl"));
    }

    #[test]
    fn test_decode_project_path() {
        assert_eq!(decode_project_path("-home-user-code"), "/home/user/code");
    }
}
