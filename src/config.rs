//! Configuration management with YAML support
//!
//! All connection paths and the device name are explicit configuration
//! handed to each importer at construction; nothing reads ambient process
//! state.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::source::voice::DEFAULT_TOLERANCE_SECONDS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Root of the archive store and other managed data
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Source device name recorded on every ingested row
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default)]
    pub claude: ClaudeConfig,

    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    #[serde(default = "default_claude_dir")]
    pub claude_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_audio_dirs")]
    pub audio_dirs: Vec<String>,

    #[serde(default = "default_transcript_dirs")]
    pub transcript_dirs: Vec<String>,

    /// Maximum audio-to-transcript timestamp distance for linking
    #[serde(default = "default_tolerance")]
    pub link_tolerance_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_log_dir")]
    pub log_dir: String,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/datalake/datalake.db".to_string()
}

fn default_data_dir() -> String {
    "~/.local/share/datalake/data".to_string()
}

fn default_device() -> String {
    "desktop".to_string()
}

fn default_claude_dir() -> String {
    "~/.claude".to_string()
}

fn default_audio_dirs() -> Vec<String> {
    vec![
        "~/Programs/recordings".to_string(),
        "~/Programs/omarchy-voice-typing/recordings".to_string(),
    ]
}

fn default_transcript_dirs() -> Vec<String> {
    vec![
        "~/Programs/transcripts".to_string(),
        "~/Programs/omarchy-voice-typing/transcripts".to_string(),
    ]
}

fn default_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECONDS
}

fn default_memory_log_dir() -> String {
    "/var/log/claude-memory".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            claude_dir: default_claude_dir(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            audio_dirs: default_audio_dirs(),
            transcript_dirs: default_transcript_dirs(),
            link_tolerance_seconds: default_tolerance(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            log_dir: default_memory_log_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            data_dir: default_data_dir(),
            device: default_device(),
            claude: ClaudeConfig::default(),
            voice: VoiceConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./datalake.yaml (current directory)
    /// 3. ~/.config/datalake/datalake.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "datalake.yaml".to_string(),
            shellexpand::tilde("~/.config/datalake/datalake.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        expand(&self.database.path)
    }

    pub fn data_dir(&self) -> PathBuf {
        expand(&self.data_dir)
    }

    pub fn claude_dir(&self) -> PathBuf {
        expand(&self.claude.claude_dir)
    }

    pub fn audio_dirs(&self) -> Vec<PathBuf> {
        self.voice.audio_dirs.iter().map(|d| expand(d)).collect()
    }

    pub fn transcript_dirs(&self) -> Vec<PathBuf> {
        self.voice.transcript_dirs.iter().map(|d| expand(d)).collect()
    }

    pub fn memory_log_dir(&self) -> PathBuf {
        expand(&self.memory.log_dir)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
