//! SQLite schema definition
//!
//! One table family per source:
//! - chatgpt_*: conversation archive imports (tree-structured exports)
//! - claude_*: coding session event logs plus prompt history
//! - audio / transcripts / voice_sessions: voice typing captures
//! - memory_*: process memory telemetry (append-only)

pub const SCHEMA: &str = r#"
-- ============================================
-- CHATGPT ARCHIVE IMPORTS
-- ============================================

-- One row per ingested export zip; zip_hash makes re-imports a no-op
CREATE TABLE IF NOT EXISTS chatgpt_imports (
    id INTEGER PRIMARY KEY,
    zip_hash TEXT NOT NULL UNIQUE,
    original_filename TEXT NOT NULL,
    zip_path TEXT,                         -- Content-addressed copy in the archive store
    conversation_count INTEGER DEFAULT 0,
    message_count INTEGER DEFAULT 0,
    source_device TEXT,
    imported_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS chatgpt_conversations (
    id INTEGER PRIMARY KEY,
    conversation_id TEXT NOT NULL UNIQUE,  -- External id from the export
    title TEXT,
    create_time REAL,                      -- Epoch seconds from the source
    update_time REAL,
    model_slug TEXT,
    is_archived INTEGER DEFAULT 0,
    is_starred INTEGER DEFAULT 0,
    message_count INTEGER DEFAULT 0,
    import_id INTEGER,                     -- Provenance, not ownership
    source_device TEXT,
    FOREIGN KEY(import_id) REFERENCES chatgpt_imports(id)
);

CREATE TABLE IF NOT EXISTS chatgpt_messages (
    id INTEGER PRIMARY KEY,
    conversation_id INTEGER NOT NULL,
    message_id TEXT,                       -- External message id
    parent_id TEXT,                        -- External parent node id, for threading
    role TEXT NOT NULL,
    content_type TEXT,
    content_text TEXT,
    create_time REAL,
    model_slug TEXT,
    sequence_number INTEGER NOT NULL,      -- Dense, zero-based, flattening order
    FOREIGN KEY(conversation_id) REFERENCES chatgpt_conversations(id) ON DELETE CASCADE
);

-- ============================================
-- CLAUDE CODE SESSIONS
-- ============================================

CREATE TABLE IF NOT EXISTS claude_sessions (
    id INTEGER PRIMARY KEY,
    session_id TEXT NOT NULL UNIQUE,
    project_path TEXT,
    project_encoded TEXT,
    summary TEXT,
    model_primary TEXT,
    claude_version TEXT,
    git_branch TEXT,
    total_messages INTEGER DEFAULT 0,
    user_messages INTEGER DEFAULT 0,
    assistant_messages INTEGER DEFAULT 0,
    total_input_tokens INTEGER DEFAULT 0,
    total_output_tokens INTEGER DEFAULT 0,
    total_cache_read_tokens INTEGER DEFAULT 0,
    total_cache_creation_tokens INTEGER DEFAULT 0,
    source_device TEXT,
    source_file TEXT,
    started_at TEXT,
    ended_at TEXT,
    duration_seconds REAL
);

CREATE TABLE IF NOT EXISTS claude_messages (
    id INTEGER PRIMARY KEY,
    session_id INTEGER NOT NULL,
    message_uuid TEXT,
    parent_uuid TEXT,
    message_type TEXT NOT NULL,            -- 'user' | 'assistant'
    role TEXT,
    model TEXT,
    content_text TEXT,
    content_thinking TEXT,
    content_images INTEGER DEFAULT 0,
    content_tool_uses INTEGER DEFAULT 0,
    content_tool_results INTEGER DEFAULT 0,
    is_sidechain INTEGER DEFAULT 0,
    cwd TEXT,
    git_branch TEXT,
    input_tokens INTEGER DEFAULT 0,
    output_tokens INTEGER DEFAULT 0,
    cache_read_tokens INTEGER DEFAULT 0,
    cache_creation_tokens INTEGER DEFAULT 0,
    stop_reason TEXT,
    request_id TEXT,
    timestamp TEXT,
    sequence_number INTEGER NOT NULL,      -- 1-based line number in the source log
    FOREIGN KEY(session_id) REFERENCES claude_sessions(id) ON DELETE CASCADE
);

-- Pointers to subagent logs found under projects/<proj>/<session-id>/
CREATE TABLE IF NOT EXISTS claude_subagents (
    id INTEGER PRIMARY KEY,
    session_id INTEGER NOT NULL,
    subagent_id TEXT NOT NULL,
    source_file TEXT,
    UNIQUE(session_id, subagent_id),
    FOREIGN KEY(session_id) REFERENCES claude_sessions(id) ON DELETE CASCADE
);

-- Prompt history entries; the uniqueness constraint makes re-runs idempotent
CREATE TABLE IF NOT EXISTS claude_history (
    id INTEGER PRIMARY KEY,
    session_id TEXT,
    display TEXT,
    pasted_contents TEXT,
    project TEXT,
    source_device TEXT,
    timestamp TEXT,
    timestamp_unix INTEGER,
    UNIQUE(session_id, timestamp_unix, display)
);

-- ============================================
-- VOICE TYPING
-- ============================================

CREATE TABLE IF NOT EXISTS audio (
    id INTEGER PRIMARY KEY,
    file_path TEXT NOT NULL UNIQUE,
    filename TEXT NOT NULL,
    original_filename TEXT,
    duration_seconds REAL,
    format TEXT,
    size_bytes INTEGER,
    source_device TEXT,
    source_project TEXT,
    created_at TEXT
);

-- audio_id clears on audio deletion; the transcript is the content of record
CREATE TABLE IF NOT EXISTS transcripts (
    id INTEGER PRIMARY KEY,
    file_path TEXT NOT NULL UNIQUE,
    filename TEXT NOT NULL,
    audio_id INTEGER,
    content TEXT,
    word_count INTEGER DEFAULT 0,
    session_uuid TEXT,
    size_bytes INTEGER,
    source_device TEXT,
    created_at TEXT,
    FOREIGN KEY(audio_id) REFERENCES audio(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS voice_sessions (
    id INTEGER PRIMARY KEY,
    audio_id INTEGER,
    transcript_id INTEGER,
    session_uuid TEXT,
    source_device TEXT,
    success INTEGER DEFAULT 0,
    created_at TEXT,
    FOREIGN KEY(audio_id) REFERENCES audio(id) ON DELETE SET NULL,
    FOREIGN KEY(transcript_id) REFERENCES transcripts(id) ON DELETE SET NULL
);

-- ============================================
-- MEMORY TELEMETRY (append-only)
-- ============================================

CREATE TABLE IF NOT EXISTS memory_metrics (
    id INTEGER PRIMARY KEY,
    pid INTEGER,
    session_id TEXT,
    rss_bytes INTEGER,
    rss_mb REAL,
    memory_rate_mb_min REAL,
    command TEXT,
    timestamp TEXT,
    timestamp_unix INTEGER NOT NULL,
    source_device TEXT
);

CREATE TABLE IF NOT EXISTS memory_events (
    id INTEGER PRIMARY KEY,
    event_type TEXT,
    pid INTEGER,
    session_id TEXT,
    severity TEXT,
    message TEXT,
    details TEXT,                          -- JSON text
    timestamp TEXT,
    timestamp_unix INTEGER NOT NULL,
    source_device TEXT
);

-- ============================================
-- INDEXES
-- ============================================

CREATE INDEX IF NOT EXISTS idx_conversations_external ON chatgpt_conversations(conversation_id);
CREATE INDEX IF NOT EXISTS idx_conversations_update ON chatgpt_conversations(update_time);
CREATE INDEX IF NOT EXISTS idx_chatgpt_messages_conv ON chatgpt_messages(conversation_id, sequence_number);

CREATE INDEX IF NOT EXISTS idx_claude_messages_session ON claude_messages(session_id, sequence_number);
CREATE INDEX IF NOT EXISTS idx_claude_history_session ON claude_history(session_id);

CREATE INDEX IF NOT EXISTS idx_transcripts_audio ON transcripts(audio_id);
CREATE INDEX IF NOT EXISTS idx_voice_sessions_created ON voice_sessions(created_at);

CREATE INDEX IF NOT EXISTS idx_memory_metrics_device ON memory_metrics(source_device, timestamp_unix);
CREATE INDEX IF NOT EXISTS idx_memory_events_device ON memory_events(source_device, timestamp_unix);
"#;
