//! SQLite storage for the datalake
//!
//! The store owns reconciliation: given an externally-identified aggregate it
//! decides insert / replace / skip. Callers wrap each import unit in a single
//! transaction via [`DatalakeStore::begin`] so partial writes are never
//! visible.

mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;

use crate::source::chatgpt::{ConversationRecord, FlatMessage};
use crate::source::claude::{ClaudeSession, HistoryEntry, SubagentRef};
use crate::source::memory::{MemoryEvent, MemoryMetric};
use crate::source::voice::{AudioCapture, TranscriptCapture};

pub use schema::SCHEMA;

/// Outcome of reconciling one aggregate against stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// No record with this external id existed; a new row was created.
    Inserted(i64),
    /// A strictly newer version arrived; the row was updated in place and its
    /// child messages deleted, ready for the fresh set.
    Replaced(i64),
    /// The stored version is as new or newer; nothing was written.
    Skipped,
}

pub struct DatalakeStore {
    conn: Connection,
}

impl DatalakeStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Start the transaction for one import unit. Dropping the returned
    /// transaction without committing rolls the whole unit back.
    pub fn begin(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    // ============================================
    // CHATGPT IMPORTS
    // ============================================

    pub fn find_import(&self, zip_hash: &str) -> Result<Option<ImportRow>> {
        let result = self.conn.query_row(
            "SELECT id, conversation_count, message_count FROM chatgpt_imports WHERE zip_hash = ?",
            params![zip_hash],
            |row| {
                Ok(ImportRow {
                    id: row.get(0)?,
                    conversation_count: row.get(1)?,
                    message_count: row.get(2)?,
                })
            },
        );

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn record_import(
        &self,
        zip_hash: &str,
        original_filename: &str,
        zip_path: Option<&str>,
        conversation_count: usize,
        source_device: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO chatgpt_imports (zip_hash, original_filename, zip_path, conversation_count, source_device)
             VALUES (?, ?, ?, ?, ?)",
            params![zip_hash, original_filename, zip_path, conversation_count as i64, source_device],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn set_import_message_count(&self, import_id: i64, count: usize) -> Result<()> {
        self.conn.execute(
            "UPDATE chatgpt_imports SET message_count = ? WHERE id = ?",
            params![count as i64, import_id],
        )?;
        Ok(())
    }

    // ============================================
    // CHATGPT CONVERSATIONS
    // ============================================

    /// Reconcile a conversation by external id. Last-writer-wins on
    /// update_time; a tie favors the stored record. A replace deletes all
    /// existing child messages so the caller can insert the fresh set.
    pub fn reconcile_conversation(
        &self,
        conv: &ConversationRecord,
        import_id: i64,
        source_device: &str,
    ) -> Result<Reconciliation> {
        let existing: Option<(i64, Option<f64>)> = match self.conn.query_row(
            "SELECT id, update_time FROM chatgpt_conversations WHERE conversation_id = ?",
            params![conv.conversation_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        ) {
            Ok(pair) => Some(pair),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        match existing {
            None => {
                self.conn.execute(
                    "INSERT INTO chatgpt_conversations
                     (conversation_id, title, create_time, update_time, model_slug,
                      is_archived, is_starred, import_id, source_device)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        conv.conversation_id,
                        conv.title,
                        conv.create_time,
                        conv.update_time,
                        conv.model_slug,
                        conv.is_archived,
                        conv.is_starred,
                        import_id,
                        source_device,
                    ],
                )?;
                Ok(Reconciliation::Inserted(self.conn.last_insert_rowid()))
            }
            Some((rowid, stored_update)) => {
                if let (Some(incoming), Some(stored)) = (conv.update_time, stored_update) {
                    if incoming <= stored {
                        return Ok(Reconciliation::Skipped);
                    }
                }

                self.conn.execute(
                    "UPDATE chatgpt_conversations
                     SET title = ?, update_time = ?, model_slug = ?,
                         is_archived = ?, is_starred = ?, import_id = ?
                     WHERE id = ?",
                    params![
                        conv.title,
                        conv.update_time,
                        conv.model_slug,
                        conv.is_archived,
                        conv.is_starred,
                        import_id,
                        rowid,
                    ],
                )?;
                self.conn.execute(
                    "DELETE FROM chatgpt_messages WHERE conversation_id = ?",
                    params![rowid],
                )?;
                Ok(Reconciliation::Replaced(rowid))
            }
        }
    }

    /// Insert the flattened message set with dense zero-based sequence numbers.
    pub fn insert_conversation_messages(
        &self,
        conversation_rowid: i64,
        messages: &[FlatMessage],
    ) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO chatgpt_messages
             (conversation_id, message_id, parent_id, role, content_type,
              content_text, create_time, model_slug, sequence_number)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;

        for (seq, msg) in messages.iter().enumerate() {
            stmt.execute(params![
                conversation_rowid,
                msg.message_id,
                msg.parent_id,
                msg.role,
                msg.content_type,
                msg.content_text,
                msg.create_time,
                msg.model_slug,
                seq as i64,
            ])?;
        }

        self.conn.execute(
            "UPDATE chatgpt_conversations SET message_count = ? WHERE id = ?",
            params![messages.len() as i64, conversation_rowid],
        )?;

        Ok(messages.len())
    }

    pub fn conversation_message_texts(&self, conversation_rowid: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT content_text FROM chatgpt_messages
             WHERE conversation_id = ? ORDER BY sequence_number",
        )?;
        let rows = stmt.query_map(params![conversation_rowid], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ============================================
    // CLAUDE SESSIONS
    // ============================================

    /// Reconcile a session by external id, last-writer-wins on ended_at.
    pub fn reconcile_session(&self, session: &ClaudeSession, source_device: &str) -> Result<Reconciliation> {
        let existing: Option<(i64, Option<String>)> = match self.conn.query_row(
            "SELECT id, ended_at FROM claude_sessions WHERE session_id = ?",
            params![session.session_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        ) {
            Ok(pair) => Some(pair),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        match existing {
            None => {
                self.conn.execute(
                    "INSERT INTO claude_sessions
                     (session_id, project_path, project_encoded, summary, model_primary,
                      claude_version, git_branch, total_messages, user_messages,
                      assistant_messages, total_input_tokens, total_output_tokens,
                      total_cache_read_tokens, total_cache_creation_tokens,
                      source_device, source_file, started_at, ended_at, duration_seconds)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        session.session_id,
                        session.project_path,
                        session.project_encoded,
                        session.summary,
                        session.model_primary,
                        session.claude_version,
                        session.git_branch,
                        session.total_messages,
                        session.user_messages,
                        session.assistant_messages,
                        session.total_input_tokens,
                        session.total_output_tokens,
                        session.total_cache_read_tokens,
                        session.total_cache_creation_tokens,
                        source_device,
                        session.source_file,
                        session.started_at,
                        session.ended_at,
                        session.duration_seconds,
                    ],
                )?;
                Ok(Reconciliation::Inserted(self.conn.last_insert_rowid()))
            }
            Some((rowid, stored_ended)) => {
                let newer = match (&session.ended_at, &stored_ended) {
                    (Some(incoming), Some(stored)) => incoming > stored,
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if !newer {
                    return Ok(Reconciliation::Skipped);
                }

                self.conn.execute(
                    "UPDATE claude_sessions
                     SET summary = ?, model_primary = ?, claude_version = ?, git_branch = ?,
                         total_messages = ?, user_messages = ?, assistant_messages = ?,
                         total_input_tokens = ?, total_output_tokens = ?,
                         total_cache_read_tokens = ?, total_cache_creation_tokens = ?,
                         source_file = ?, started_at = ?, ended_at = ?, duration_seconds = ?
                     WHERE id = ?",
                    params![
                        session.summary,
                        session.model_primary,
                        session.claude_version,
                        session.git_branch,
                        session.total_messages,
                        session.user_messages,
                        session.assistant_messages,
                        session.total_input_tokens,
                        session.total_output_tokens,
                        session.total_cache_read_tokens,
                        session.total_cache_creation_tokens,
                        session.source_file,
                        session.started_at,
                        session.ended_at,
                        session.duration_seconds,
                        rowid,
                    ],
                )?;
                self.conn.execute(
                    "DELETE FROM claude_messages WHERE session_id = ?",
                    params![rowid],
                )?;
                Ok(Reconciliation::Replaced(rowid))
            }
        }
    }

    pub fn insert_session_messages(&self, session_rowid: i64, session: &ClaudeSession) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO claude_messages
             (session_id, message_uuid, parent_uuid, message_type, role, model,
              content_text, content_thinking, content_images, content_tool_uses,
              content_tool_results, is_sidechain, cwd, git_branch, input_tokens,
              output_tokens, cache_read_tokens, cache_creation_tokens, stop_reason,
              request_id, timestamp, sequence_number)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;

        for msg in &session.messages {
            stmt.execute(params![
                session_rowid,
                msg.message_uuid,
                msg.parent_uuid,
                msg.message_type,
                msg.role,
                msg.model,
                msg.content_text,
                msg.content_thinking,
                msg.content_images,
                msg.content_tool_uses,
                msg.content_tool_results,
                msg.is_sidechain,
                msg.cwd,
                msg.git_branch,
                msg.input_tokens,
                msg.output_tokens,
                msg.cache_read_tokens,
                msg.cache_creation_tokens,
                msg.stop_reason,
                msg.request_id,
                msg.timestamp,
                msg.sequence_number,
            ])?;
        }

        Ok(session.messages.len())
    }

    /// Record a subagent log pointer under its parent session. Re-imports of
    /// the same subagent are ignored.
    pub fn insert_subagent(&self, session_rowid: i64, subagent: &SubagentRef) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO claude_subagents (session_id, subagent_id, source_file)
             VALUES (?, ?, ?)",
            params![session_rowid, subagent.subagent_id, subagent.source_file],
        )?;
        Ok(changed > 0)
    }

    /// Returns true if the entry was new. The table's uniqueness constraint
    /// makes repeated history imports idempotent.
    pub fn insert_history_entry(&self, entry: &HistoryEntry, source_device: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO claude_history
             (session_id, display, pasted_contents, project, source_device,
              timestamp, timestamp_unix)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                entry.session_id,
                entry.display,
                entry.pasted_contents,
                entry.project,
                source_device,
                entry.timestamp,
                entry.timestamp_unix,
            ],
        )?;
        Ok(changed > 0)
    }

    // ============================================
    // VOICE
    // ============================================

    /// Insert an audio capture, returning (rowid, inserted). An already-known
    /// path returns the existing rowid unchanged.
    pub fn insert_audio(&self, audio: &AudioCapture, source_device: &str) -> Result<(i64, bool)> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO audio
             (file_path, filename, original_filename, duration_seconds, format,
              size_bytes, source_device, source_project, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                audio.file_path,
                audio.filename,
                audio.original_filename,
                audio.duration_seconds,
                audio.format,
                audio.size_bytes,
                source_device,
                audio.source_project,
                audio.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            ],
        )?;

        if changed > 0 {
            Ok((self.conn.last_insert_rowid(), true))
        } else {
            let id = self.conn.query_row(
                "SELECT id FROM audio WHERE file_path = ?",
                params![audio.file_path],
                |row| row.get(0),
            )?;
            Ok((id, false))
        }
    }

    pub fn insert_transcript(
        &self,
        transcript: &TranscriptCapture,
        audio_id: Option<i64>,
        source_device: &str,
    ) -> Result<(i64, bool)> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO transcripts
             (file_path, filename, audio_id, content, word_count, session_uuid,
              size_bytes, source_device, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                transcript.file_path,
                transcript.filename,
                audio_id,
                transcript.content,
                transcript.word_count,
                transcript.session_uuid,
                transcript.size_bytes,
                source_device,
                transcript.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            ],
        )?;

        if changed > 0 {
            Ok((self.conn.last_insert_rowid(), true))
        } else {
            let id = self.conn.query_row(
                "SELECT id FROM transcripts WHERE file_path = ?",
                params![transcript.file_path],
                |row| row.get(0),
            )?;
            Ok((id, false))
        }
    }

    pub fn insert_voice_session(
        &self,
        audio_id: Option<i64>,
        transcript_id: Option<i64>,
        session_uuid: Option<&str>,
        source_device: &str,
        success: bool,
        created_at: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO voice_sessions
             (audio_id, transcript_id, session_uuid, source_device, success, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![audio_id, transcript_id, session_uuid, source_device, success, created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ============================================
    // MEMORY TELEMETRY
    // ============================================

    /// High-water mark for incremental metric ingestion: the maximum stored
    /// timestamp for this device, 0 if none. Recomputed each run, never
    /// stored separately.
    pub fn last_metric_timestamp(&self, source_device: &str) -> Result<i64> {
        let ts: Option<i64> = self.conn.query_row(
            "SELECT MAX(timestamp_unix) FROM memory_metrics WHERE source_device = ?",
            params![source_device],
            |row| row.get(0),
        )?;
        Ok(ts.unwrap_or(0))
    }

    pub fn last_event_timestamp(&self, source_device: &str) -> Result<i64> {
        let ts: Option<i64> = self.conn.query_row(
            "SELECT MAX(timestamp_unix) FROM memory_events WHERE source_device = ?",
            params![source_device],
            |row| row.get(0),
        )?;
        Ok(ts.unwrap_or(0))
    }

    pub fn insert_metric(&self, metric: &MemoryMetric, source_device: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO memory_metrics
             (pid, session_id, rss_bytes, rss_mb, memory_rate_mb_min, command,
              timestamp, timestamp_unix, source_device)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                metric.pid,
                metric.session_id,
                metric.rss_bytes,
                metric.rss_mb,
                metric.memory_rate_mb_min,
                metric.command,
                metric.timestamp,
                metric.timestamp_unix,
                source_device,
            ],
        )?;
        Ok(())
    }

    pub fn insert_event(&self, event: &MemoryEvent, source_device: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO memory_events
             (event_type, pid, session_id, severity, message, details,
              timestamp, timestamp_unix, source_device)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                event.event_type,
                event.pid,
                event.session_id,
                event.severity,
                event.message,
                event.details,
                event.timestamp,
                event.timestamp_unix,
                source_device,
            ],
        )?;
        Ok(())
    }

    pub fn metric_timestamps(&self, source_device: &str) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp_unix FROM memory_metrics WHERE source_device = ? ORDER BY timestamp_unix",
        )?;
        let rows = stmt.query_map(params![source_device], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ============================================
    // STATS
    // ============================================

    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<i64> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
                .map_err(Into::into)
        };

        Ok(StoreStats {
            imports: count("chatgpt_imports")?,
            conversations: count("chatgpt_conversations")?,
            conversation_messages: count("chatgpt_messages")?,
            sessions: count("claude_sessions")?,
            session_messages: count("claude_messages")?,
            subagents: count("claude_subagents")?,
            history_entries: count("claude_history")?,
            audio_files: count("audio")?,
            transcripts: count("transcripts")?,
            voice_sessions: count("voice_sessions")?,
            memory_metrics: count("memory_metrics")?,
            memory_events: count("memory_events")?,
        })
    }
}

// ============================================
// ROW TYPES
// ============================================

#[derive(Debug, Clone)]
pub struct ImportRow {
    pub id: i64,
    pub conversation_count: i64,
    pub message_count: i64,
}

#[derive(Debug, Default)]
pub struct StoreStats {
    pub imports: i64,
    pub conversations: i64,
    pub conversation_messages: i64,
    pub sessions: i64,
    pub session_messages: i64,
    pub subagents: i64,
    pub history_entries: i64,
    pub audio_files: i64,
    pub transcripts: i64,
    pub voice_sessions: i64,
    pub memory_metrics: i64,
    pub memory_events: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::chatgpt::ChatGptImporter;
    use crate::source::claude::ClaudeImporter;
    use crate::source::memory::{MemoryImporter, MemoryMetric};
    use crate::source::voice::VoiceImporter;
    use std::io::Write;

    fn test_store() -> (tempfile::TempDir, DatalakeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DatalakeStore::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn conv(id: &str, update_time: Option<f64>) -> ConversationRecord {
        ConversationRecord {
            conversation_id: id.to_string(),
            title: Some("Test".to_string()),
            create_time: Some(1.0),
            update_time,
            model_slug: None,
            is_archived: false,
            is_starred: false,
        }
    }

    fn msg(text: &str) -> FlatMessage {
        FlatMessage {
            message_id: Some(format!("m-{}", text)),
            parent_id: None,
            role: "user".to_string(),
            content_type: "text".to_string(),
            content_text: text.to_string(),
            create_time: None,
            model_slug: None,
        }
    }

    fn session(id: &str, ended_at: Option<&str>) -> ClaudeSession {
        ClaudeSession {
            session_id: id.to_string(),
            project_path: "/home/user/project".to_string(),
            project_encoded: "-home-user-project".to_string(),
            summary: None,
            model_primary: None,
            claude_version: None,
            git_branch: None,
            total_messages: 0,
            user_messages: 0,
            assistant_messages: 0,
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_cache_read_tokens: 0,
            total_cache_creation_tokens: 0,
            source_file: format!("{}.jsonl", id),
            started_at: None,
            ended_at: ended_at.map(String::from),
            duration_seconds: None,
            messages: Vec::new(),
        }
    }

    #[test]
    fn test_conversation_insert_then_older_skipped() {
        let (_dir, store) = test_store();
        let import_id = store.record_import("hash-1", "export.zip", None, 1, "dev").unwrap();

        let outcome = store
            .reconcile_conversation(&conv("c1", Some(100.0)), import_id, "dev")
            .unwrap();
        let rowid = match outcome {
            Reconciliation::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };
        store
            .insert_conversation_messages(rowid, &[msg("old one"), msg("old two")])
            .unwrap();

        // An older version must leave the stored record and messages alone
        let outcome = store
            .reconcile_conversation(&conv("c1", Some(99.0)), import_id, "dev")
            .unwrap();
        assert_eq!(outcome, Reconciliation::Skipped);
        assert_eq!(
            store.conversation_message_texts(rowid).unwrap(),
            vec!["old one", "old two"]
        );
    }

    #[test]
    fn test_conversation_tie_keeps_stored() {
        let (_dir, store) = test_store();
        let import_id = store.record_import("hash-1", "export.zip", None, 1, "dev").unwrap();

        store
            .reconcile_conversation(&conv("c1", Some(100.0)), import_id, "dev")
            .unwrap();
        let outcome = store
            .reconcile_conversation(&conv("c1", Some(100.0)), import_id, "dev")
            .unwrap();
        assert_eq!(outcome, Reconciliation::Skipped);
    }

    #[test]
    fn test_conversation_newer_replaces_all_messages() {
        let (_dir, store) = test_store();
        let import_id = store.record_import("hash-1", "export.zip", None, 1, "dev").unwrap();

        let rowid = match store
            .reconcile_conversation(&conv("c1", Some(100.0)), import_id, "dev")
            .unwrap()
        {
            Reconciliation::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };
        store
            .insert_conversation_messages(rowid, &[msg("old one"), msg("old two")])
            .unwrap();

        let outcome = store
            .reconcile_conversation(&conv("c1", Some(101.0)), import_id, "dev")
            .unwrap();
        assert_eq!(outcome, Reconciliation::Replaced(rowid));
        // The replace already cleared the old set
        assert!(store.conversation_message_texts(rowid).unwrap().is_empty());

        store.insert_conversation_messages(rowid, &[msg("new")]).unwrap();
        assert_eq!(store.conversation_message_texts(rowid).unwrap(), vec!["new"]);
    }

    #[test]
    fn test_session_last_writer_wins_on_ended_at() {
        let (_dir, store) = test_store();

        let rowid = match store
            .reconcile_session(&session("s1", Some("2026-01-01T10:00:00Z")), "dev")
            .unwrap()
        {
            Reconciliation::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        let outcome = store
            .reconcile_session(&session("s1", Some("2026-01-01T09:00:00Z")), "dev")
            .unwrap();
        assert_eq!(outcome, Reconciliation::Skipped);

        let outcome = store
            .reconcile_session(&session("s1", Some("2026-01-01T11:00:00Z")), "dev")
            .unwrap();
        assert_eq!(outcome, Reconciliation::Replaced(rowid));

        // A version with no end stamp never displaces one that has one
        let outcome = store.reconcile_session(&session("s1", None), "dev").unwrap();
        assert_eq!(outcome, Reconciliation::Skipped);
    }

    #[test]
    fn test_history_entry_idempotent() {
        let (_dir, store) = test_store();
        let entry = HistoryEntry {
            session_id: "s1".to_string(),
            display: "do the thing".to_string(),
            pasted_contents: String::new(),
            project: "/home/user/project".to_string(),
            timestamp: Some("2026-01-01T10:00:00".to_string()),
            timestamp_unix: 1767261600,
        };

        assert!(store.insert_history_entry(&entry, "dev").unwrap());
        assert!(!store.insert_history_entry(&entry, "dev").unwrap());
        assert_eq!(store.stats().unwrap().history_entries, 1);
    }

    fn write_export_zip(path: &Path, payload: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("conversations.json", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(payload.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_archive_import_is_idempotent() {
        let (dir, store) = test_store();
        let zip_path = dir.path().join("export.zip");
        write_export_zip(
            &zip_path,
            &serde_json::json!([{
                "id": "c1",
                "title": "Hello",
                "create_time": 1.0,
                "update_time": 2.0,
                "mapping": {
                    "root": {
                        "message": {
                            "id": "m1",
                            "author": {"role": "user"},
                            "content": {"content_type": "text", "parts": ["hi"]},
                        },
                        "parent": null,
                        "children": [],
                    },
                },
            }])
            .to_string(),
        );

        let importer = ChatGptImporter::new(&store, dir.path().join("data"), "dev");

        let first = importer.import_from_zip(&zip_path).unwrap();
        assert_eq!(first.conversations_new, 1);
        assert_eq!(first.messages_imported, 1);
        assert!(!first.duplicate_archive);

        let second = importer.import_from_zip(&zip_path).unwrap();
        assert!(second.duplicate_archive);
        assert_eq!(second.conversations_new, 0);

        let stats = store.stats().unwrap();
        assert_eq!(stats.imports, 1);
        assert_eq!(stats.conversations, 1);
        assert_eq!(stats.conversation_messages, 1);
    }

    #[test]
    fn test_voice_rerun_writes_no_new_sessions() {
        let (dir, store) = test_store();
        let audio_dir = dir.path().join("recordings");
        let transcript_dir = dir.path().join("transcripts");
        std::fs::create_dir_all(&audio_dir).unwrap();
        std::fs::create_dir_all(&transcript_dir).unwrap();
        std::fs::write(audio_dir.join("20250114_120000_rec.wav"), b"not real audio").unwrap();
        std::fs::write(
            transcript_dir.join("20250114_120030_0a1b2c3d.txt"),
            "hello world",
        )
        .unwrap();

        let importer = VoiceImporter::new(&store, "dev");
        let first = importer
            .run(&[audio_dir.clone()], &[transcript_dir.clone()], 60)
            .unwrap();
        assert_eq!(first.sessions, 1);
        assert_eq!(first.linked, 1);

        // Unchanged directories must not grow the session table
        let second = importer.run(&[audio_dir], &[transcript_dir], 60).unwrap();
        assert_eq!(second.sessions, 0);

        let stats = store.stats().unwrap();
        assert_eq!(stats.audio_files, 1);
        assert_eq!(stats.transcripts, 1);
        assert_eq!(stats.voice_sessions, 1);
    }

    #[test]
    fn test_subagent_pointers_recorded_once() {
        let (dir, store) = test_store();
        let claude_dir = dir.path().join("claude");
        let session_id = "0199b2b1-53f8-7452-8a5c-013a53821afe";
        let project_dir = claude_dir.join("projects").join("-home-x");
        std::fs::create_dir_all(project_dir.join(session_id)).unwrap();
        std::fs::write(
            project_dir.join(format!("{}.jsonl", session_id)),
            r#"{"type":"user","uuid":"u1","timestamp":"2025-01-14T10:00:00Z","message":{"role":"user","content":"hi"}}"#,
        )
        .unwrap();
        std::fs::write(project_dir.join(session_id).join("agent-one.jsonl"), "").unwrap();

        let importer = ClaudeImporter::new(&store, &claude_dir, "dev");
        let first = importer.run().unwrap();
        assert_eq!(first.sessions_new, 1);
        assert_eq!(first.subagents, 1);

        let second = importer.run().unwrap();
        assert_eq!(second.sessions_skipped, 1);
        assert_eq!(second.subagents, 0);
        assert_eq!(store.stats().unwrap().subagents, 1);
    }

    fn metric(ts: i64) -> MemoryMetric {
        MemoryMetric {
            pid: 42,
            session_id: None,
            rss_bytes: 1024,
            rss_mb: 0.001,
            memory_rate_mb_min: None,
            command: None,
            timestamp: String::new(),
            timestamp_unix: ts,
        }
    }

    #[test]
    fn test_metric_watermark_end_to_end() {
        let (dir, store) = test_store();
        store.insert_metric(&metric(100), "dev").unwrap();
        store.insert_metric(&metric(200), "dev").unwrap();
        assert_eq!(store.last_metric_timestamp("dev").unwrap(), 200);

        // The log replays one already-seen record and adds one new one
        let log_dir = dir.path().join("memlogs");
        std::fs::create_dir_all(&log_dir).unwrap();
        let mut file = std::fs::File::create(log_dir.join("metrics.jsonl")).unwrap();
        writeln!(file, r#"{{"timestamp":150,"pid":42,"rss_bytes":1,"rss_mb":0.1}}"#).unwrap();
        writeln!(file, r#"{{"timestamp":250,"pid":42,"rss_bytes":2,"rss_mb":0.2}}"#).unwrap();

        let stats = MemoryImporter::new(&store, &log_dir, "dev").run().unwrap();
        assert_eq!(stats.metrics_ingested, 1);
        assert_eq!(store.metric_timestamps("dev").unwrap(), vec![100, 200, 250]);

        // Watermarks are per device
        assert_eq!(store.last_metric_timestamp("other").unwrap(), 0);
    }
}
