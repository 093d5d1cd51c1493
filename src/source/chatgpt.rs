//! ChatGPT export archive importer
//!
//! Parses `conversations.json` out of an export zip, flattens each
//! conversation's branching message tree into a linear sequence, and
//! reconciles against the store. A byte-identical zip is recognized by its
//! digest and the whole import becomes a no-op.

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::hash;
use crate::store::{DatalakeStore, Reconciliation};

/// Conversation-level fields extracted from one export entry.
#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub title: Option<String>,
    pub create_time: Option<f64>,
    pub update_time: Option<f64>,
    pub model_slug: Option<String>,
    pub is_archived: bool,
    pub is_starred: bool,
}

/// One message emitted by the tree flattener, in traversal order.
#[derive(Debug, Clone)]
pub struct FlatMessage {
    pub message_id: Option<String>,
    pub parent_id: Option<String>,
    pub role: String,
    pub content_type: String,
    pub content_text: String,
    pub create_time: Option<f64>,
    pub model_slug: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    pub conversations_new: usize,
    pub conversations_updated: usize,
    pub conversations_skipped: usize,
    pub messages_imported: usize,
    /// True when the zip digest matched a previous import and nothing was written.
    pub duplicate_archive: bool,
}

// ============================================
// TREE FLATTENING
// ============================================

/// Flatten a conversation `mapping` into a pre-order message sequence
/// starting at `root_id`. Children are visited in their listed order, not
/// sorted by time. The visited set terminates cycles and repeated ids in
/// malformed exports; an explicit stack keeps deeply nested trees off the
/// call stack.
pub fn flatten_mapping<'a>(mapping: &'a Map<String, Value>, root_id: &'a str) -> Vec<FlatMessage> {
    let mut out = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![root_id];

    while let Some(node_id) = stack.pop() {
        if !visited.insert(node_id) {
            continue;
        }
        let Some(node) = mapping.get(node_id) else {
            continue;
        };

        if let Some(msg) = node.get("message").filter(|m| !m.is_null()) {
            if !is_hidden(msg) {
                let parent = node.get("parent").and_then(|p| p.as_str());
                out.push(message_from_node(msg, parent));
            }
        }

        // Reverse push so the first listed child is flattened first
        if let Some(children) = node.get("children").and_then(|c| c.as_array()) {
            for child in children.iter().rev() {
                if let Some(id) = child.as_str() {
                    stack.push(id);
                }
            }
        }
    }

    out
}

fn is_hidden(msg: &Value) -> bool {
    msg.get("metadata")
        .and_then(|m| m.get("is_visually_hidden_from_conversation"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn message_from_node(msg: &Value, parent: Option<&str>) -> FlatMessage {
    let (content_text, content_type) = extract_content(msg.get("content").unwrap_or(&Value::Null));

    FlatMessage {
        message_id: msg.get("id").and_then(|v| v.as_str()).map(String::from),
        parent_id: parent.map(String::from),
        role: msg
            .get("author")
            .and_then(|a| a.get("role"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string(),
        content_type,
        content_text,
        create_time: msg.get("create_time").and_then(|v| v.as_f64()),
        model_slug: msg
            .get("metadata")
            .and_then(|m| m.get("model_slug"))
            .and_then(|v| v.as_str())
            .map(String::from),
    }
}

// ============================================
// CONTENT EXTRACTION
// ============================================

const EMPTY_PARTS: &[Value] = &[];

/// Tagged view over the export's loosely-typed `content` field.
enum MessageContent<'a> {
    Text { parts: &'a [Value] },
    Code { text: &'a str },
    ExecutionOutput { text: &'a str },
    Multimodal { parts: &'a [Value] },
    Unrecognized { content_type: &'a str, parts: &'a [Value] },
}

fn classify_content(content: &Value) -> MessageContent<'_> {
    let content_type = content
        .get("content_type")
        .and_then(|v| v.as_str())
        .unwrap_or("text");
    let parts = content
        .get("parts")
        .and_then(|p| p.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(EMPTY_PARTS);
    let text = content.get("text").and_then(|v| v.as_str()).unwrap_or("");

    match content_type {
        "text" => MessageContent::Text { parts },
        "code" => MessageContent::Code { text },
        "execution_output" => MessageContent::ExecutionOutput { text },
        "multimodal_text" => MessageContent::Multimodal { parts },
        other => MessageContent::Unrecognized {
            content_type: other,
            parts,
        },
    }
}

/// Render a message's content to text, returning (text, content_type).
pub fn extract_content(content: &Value) -> (String, String) {
    match classify_content(content) {
        MessageContent::Text { parts } => {
            let text: String = parts.iter().filter_map(part_text).collect();
            (text, "text".to_string())
        }
        MessageContent::Code { text } => (format!("```\n{}\n```", text), "code".to_string()),
        MessageContent::ExecutionOutput { text } => {
            (format!("[Execution Output]\n{}", text), "execution_output".to_string())
        }
        MessageContent::Multimodal { parts } => {
            let mut result = String::new();
            for part in parts {
                match part {
                    Value::String(s) => result.push_str(s),
                    Value::Object(obj) => {
                        if obj.get("content_type").and_then(|v| v.as_str())
                            == Some("image_asset_pointer")
                        {
                            result.push_str("[Image]");
                        } else if let Some(text) = obj.get("text").and_then(|v| v.as_str()) {
                            result.push_str(text);
                        }
                        // Parts without text are ignored
                    }
                    _ => {}
                }
            }
            (result, "multimodal_text".to_string())
        }
        MessageContent::Unrecognized { content_type, parts } => {
            // Fall back to the first raw part, or empty
            let text = parts
                .first()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .unwrap_or_default();
            (text, content_type.to_string())
        }
    }
}

fn part_text(part: &Value) -> Option<String> {
    match part {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}

// ============================================
// ARCHIVE IMPORT
// ============================================

pub struct ChatGptImporter<'a> {
    store: &'a DatalakeStore,
    data_dir: PathBuf,
    device: String,
}

impl<'a> ChatGptImporter<'a> {
    pub fn new(store: &'a DatalakeStore, data_dir: impl Into<PathBuf>, device: impl Into<String>) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
            device: device.into(),
        }
    }

    /// Import one export zip as a single transaction.
    pub fn import_from_zip(&self, zip_path: &Path) -> Result<ImportStats> {
        // Digest check comes before any parsing work
        let zip_hash = hash::sha256_file(zip_path)?;
        if let Some(prev) = self.store.find_import(&zip_hash)? {
            info!(
                import_id = prev.id,
                conversations = prev.conversation_count,
                "Archive already imported, skipping"
            );
            return Ok(ImportStats {
                duplicate_archive: true,
                ..Default::default()
            });
        }

        let raw = match read_conversations_json(zip_path)? {
            Some(bytes) => bytes,
            None => {
                warn!(path = %zip_path.display(), "conversations.json not found in archive");
                return Ok(ImportStats::default());
            }
        };
        let conversations: Vec<Value> =
            serde_json::from_slice(&raw).context("conversations.json is not a JSON array")?;

        let stored_path = store_raw_archive(zip_path, &self.data_dir, &zip_hash)?;
        let original_filename = zip_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("archive.zip");

        let tx = self.store.begin()?;
        let import_id = self.store.record_import(
            &zip_hash,
            original_filename,
            stored_path.to_str(),
            conversations.len(),
            &self.device,
        )?;

        let mut stats = ImportStats::default();
        for conv in &conversations {
            match self.import_conversation(conv, import_id)? {
                Some((Reconciliation::Inserted(_), count)) => {
                    stats.conversations_new += 1;
                    stats.messages_imported += count;
                }
                Some((Reconciliation::Replaced(_), count)) => {
                    stats.conversations_updated += 1;
                    stats.messages_imported += count;
                }
                Some((Reconciliation::Skipped, _)) | None => {
                    stats.conversations_skipped += 1;
                }
            }
        }

        self.store.set_import_message_count(import_id, stats.messages_imported)?;
        tx.commit()?;

        Ok(stats)
    }

    /// Returns None for a conversation entry missing its id (malformed,
    /// tolerated individually).
    fn import_conversation(
        &self,
        conv: &Value,
        import_id: i64,
    ) -> Result<Option<(Reconciliation, usize)>> {
        let Some(conversation_id) = conv.get("id").and_then(|v| v.as_str()) else {
            warn!("Skipping conversation entry without an id");
            return Ok(None);
        };

        let record = ConversationRecord {
            conversation_id: conversation_id.to_string(),
            title: conv.get("title").and_then(|v| v.as_str()).map(String::from),
            create_time: conv.get("create_time").and_then(|v| v.as_f64()),
            update_time: conv.get("update_time").and_then(|v| v.as_f64()),
            model_slug: conv
                .get("default_model_slug")
                .and_then(|v| v.as_str())
                .map(String::from),
            is_archived: conv.get("is_archived").and_then(|v| v.as_bool()).unwrap_or(false),
            is_starred: conv.get("is_starred").and_then(|v| v.as_bool()).unwrap_or(false),
        };

        let outcome = self.store.reconcile_conversation(&record, import_id, &self.device)?;
        let rowid = match outcome {
            Reconciliation::Inserted(id) | Reconciliation::Replaced(id) => id,
            Reconciliation::Skipped => return Ok(Some((outcome, 0))),
        };

        let Some(mapping) = conv.get("mapping").and_then(|m| m.as_object()) else {
            return Ok(Some((outcome, 0)));
        };
        // The export carries no root marker; by convention the root is the
        // first key in serialized order (preserved by the order-keeping map).
        let Some(root_id) = mapping.keys().next() else {
            return Ok(Some((outcome, 0)));
        };

        let messages = flatten_mapping(mapping, root_id);
        let count = self.store.insert_conversation_messages(rowid, &messages)?;

        Ok(Some((outcome, count)))
    }
}

fn read_conversations_json(zip_path: &Path) -> Result<Option<Vec<u8>>> {
    let file = fs::File::open(zip_path)
        .with_context(|| format!("Failed to open {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("Failed to read zip archive")?;

    let mut entry = match archive.by_name("conversations.json") {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

/// Copy the raw zip into the content-addressed archive store. The digest
/// prefix keeps distinct archives sharing a filename from silently
/// overwriting each other.
fn store_raw_archive(zip_path: &Path, data_dir: &Path, digest: &str) -> Result<PathBuf> {
    let imports_dir = data_dir.join("imports").join("chatgpt");
    fs::create_dir_all(&imports_dir)?;

    let stem = zip_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("archive");
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let stored = imports_dir.join(format!("{}_{}_{}.zip", &digest[..8], stem, stamp));

    fs::copy(zip_path, &stored)
        .with_context(|| format!("Failed to archive {}", zip_path.display()))?;
    Ok(stored)
}
