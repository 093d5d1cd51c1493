//! Voice typing importer
//!
//! Scans audio and transcript directories, parses capture timestamps out of
//! the filenames, and links the two sets by nearest-timestamp proximity. The
//! matcher is greedy and order-dependent: an earlier recording may claim the
//! transcript nearest to a later one.

use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use crate::store::DatalakeStore;

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac"];

/// Default linking tolerance in seconds.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 60;

#[derive(Debug, Clone)]
pub struct AudioCapture {
    pub file_path: String,
    pub filename: String,
    pub original_filename: String,
    pub timestamp: NaiveDateTime,
    pub duration_seconds: Option<f64>,
    pub format: String,
    pub size_bytes: i64,
    pub source_project: String,
}

#[derive(Debug, Clone)]
pub struct TranscriptCapture {
    pub file_path: String,
    pub filename: String,
    pub content: String,
    pub word_count: i64,
    pub session_uuid: String,
    pub timestamp: NaiveDateTime,
    pub size_bytes: i64,
    pub source_project: String,
}

/// Outcome of the matching heuristic: audio with an optional transcript, or
/// an orphaned transcript with no audio.
#[derive(Debug, Clone)]
pub struct VoiceSession {
    pub audio: Option<AudioCapture>,
    pub transcript: Option<TranscriptCapture>,
    pub success: bool,
    pub created_at: NaiveDateTime,
}

// ============================================
// FILENAME PARSING
// ============================================

/// Audio names follow `YYYYMMDD_HHMMSS_<label>.<ext>`.
fn parse_audio_filename(name: &str) -> Option<(NaiveDateTime, String, String)> {
    let (timestamp, rest) = parse_stamped_filename(name)?;
    let (label, ext) = rest.rsplit_once('.')?;
    if label.is_empty() || !AUDIO_EXTENSIONS.contains(&ext) {
        return None;
    }
    Some((timestamp, label.to_string(), ext.to_string()))
}

/// Transcript names follow `YYYYMMDD_HHMMSS_<uuid>.txt`.
fn parse_transcript_filename(name: &str) -> Option<(NaiveDateTime, String)> {
    let (timestamp, rest) = parse_stamped_filename(name)?;
    let uuid = rest.strip_suffix(".txt")?;
    if uuid.is_empty() || !uuid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase() || c == '-') {
        return None;
    }
    Some((timestamp, uuid.to_string()))
}

/// Split off the leading `YYYYMMDD_HHMMSS_` stamp. The timestamp comes from
/// the filename, never from file metadata.
fn parse_stamped_filename(name: &str) -> Option<(NaiveDateTime, &str)> {
    if name.len() < 16 || name.as_bytes().get(15) != Some(&b'_') {
        return None;
    }
    let stamp = &name[..15];
    let timestamp = NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S").ok()?;
    Some((timestamp, &name[16..]))
}

// ============================================
// SCANNING
// ============================================

pub fn scan_audio(dirs: &[PathBuf]) -> Result<Vec<AudioCapture>> {
    let mut captures = Vec::new();

    for dir in dirs {
        if !dir.exists() {
            warn!(path = %dir.display(), "Audio directory not found");
            continue;
        }
        let source_project = project_label(dir);
        info!(path = %dir.display(), "Scanning audio");

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((timestamp, label, format)) = parse_audio_filename(name) else {
                continue;
            };

            let size_bytes = path.metadata().map(|m| m.len() as i64).unwrap_or(0);
            captures.push(AudioCapture {
                file_path: path.to_string_lossy().to_string(),
                filename: name.to_string(),
                original_filename: format!("{}.{}", label, format),
                timestamp,
                duration_seconds: probe_duration(&path),
                format,
                size_bytes,
                source_project: source_project.clone(),
            });
        }
    }

    Ok(captures)
}

pub fn scan_transcripts(dirs: &[PathBuf]) -> Result<Vec<TranscriptCapture>> {
    let mut captures = Vec::new();

    for dir in dirs {
        if !dir.exists() {
            warn!(path = %dir.display(), "Transcript directory not found");
            continue;
        }
        let source_project = project_label(dir);
        info!(path = %dir.display(), "Scanning transcripts");

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((timestamp, session_uuid)) = parse_transcript_filename(name) else {
                continue;
            };

            // Unreadable content degrades to an empty transcript, not an error
            let content = std::fs::read_to_string(&path)
                .map(|c| c.trim().to_string())
                .unwrap_or_default();
            let word_count = content.split_whitespace().count() as i64;
            let size_bytes = path.metadata().map(|m| m.len() as i64).unwrap_or(0);

            captures.push(TranscriptCapture {
                file_path: path.to_string_lossy().to_string(),
                filename: name.to_string(),
                content,
                word_count,
                session_uuid,
                timestamp,
                size_bytes,
                source_project: source_project.clone(),
            });
        }
    }

    Ok(captures)
}

/// The parent directory names the capturing project.
fn project_label(dir: &Path) -> String {
    dir.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("recordings")
        .to_string()
}

/// Audio duration via ffprobe; absence of the tool or a failed probe leaves
/// the duration unset.
fn probe_duration(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()?.trim().parse().ok()
}

// ============================================
// TIMESTAMP LINKING
// ============================================

/// Greedily pair recordings with transcripts by nearest timestamp within
/// `tolerance_seconds`. Every transcript never claimed by the greedy pass is
/// emitted afterwards as an orphan.
pub fn link_sessions(
    mut audio: Vec<AudioCapture>,
    mut transcripts: Vec<TranscriptCapture>,
    tolerance_seconds: i64,
) -> Vec<VoiceSession> {
    audio.sort_by_key(|a| a.timestamp);
    transcripts.sort_by_key(|t| t.timestamp);

    let mut used = vec![false; transcripts.len()];
    let mut sessions = Vec::new();

    for item in audio {
        let mut best: Option<(usize, i64)> = None;
        for (i, transcript) in transcripts.iter().enumerate() {
            if used[i] {
                continue;
            }
            let diff = (transcript.timestamp - item.timestamp).num_seconds().abs();
            if diff <= tolerance_seconds && best.map_or(true, |(_, d)| diff < d) {
                best = Some((i, diff));
            }
        }

        let matched = best.map(|(i, _)| {
            used[i] = true;
            transcripts[i].clone()
        });

        sessions.push(VoiceSession {
            success: matched.as_ref().map_or(false, |t| t.word_count > 0),
            created_at: item.timestamp,
            audio: Some(item),
            transcript: matched,
        });
    }

    for (i, transcript) in transcripts.into_iter().enumerate() {
        if used[i] {
            continue;
        }
        sessions.push(VoiceSession {
            success: transcript.word_count > 0,
            created_at: transcript.timestamp,
            audio: None,
            transcript: Some(transcript),
        });
    }

    sessions
}

// ============================================
// IMPORT
// ============================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VoiceImportStats {
    pub audio_files: usize,
    pub transcripts: usize,
    pub sessions: usize,
    pub linked: usize,
    pub orphans: usize,
}

pub struct VoiceImporter<'a> {
    store: &'a DatalakeStore,
    device: String,
}

impl<'a> VoiceImporter<'a> {
    pub fn new(store: &'a DatalakeStore, device: impl Into<String>) -> Self {
        Self {
            store,
            device: device.into(),
        }
    }

    /// One voice run is one import unit. A session row is recorded only when
    /// the pair carries at least one newly seen file, so re-running over an
    /// unchanged directory writes nothing.
    pub fn run(
        &self,
        audio_dirs: &[PathBuf],
        transcript_dirs: &[PathBuf],
        tolerance_seconds: i64,
    ) -> Result<VoiceImportStats> {
        let audio = scan_audio(audio_dirs)?;
        let transcripts = scan_transcripts(transcript_dirs)?;
        info!(audio = audio.len(), transcripts = transcripts.len(), "Scanned voice captures");

        let mut stats = VoiceImportStats {
            audio_files: audio.len(),
            transcripts: transcripts.len(),
            ..Default::default()
        };

        let tx = self.store.begin()?;
        for session in link_sessions(audio, transcripts, tolerance_seconds) {
            let (audio_id, audio_new) = match &session.audio {
                Some(a) => {
                    let (id, new) = self.store.insert_audio(a, &self.device)?;
                    (Some(id), new)
                }
                None => (None, false),
            };
            let (transcript_id, transcript_new) = match &session.transcript {
                Some(t) => {
                    let (id, new) = self.store.insert_transcript(t, audio_id, &self.device)?;
                    (Some(id), new)
                }
                None => (None, false),
            };

            if !audio_new && !transcript_new {
                continue;
            }

            self.store.insert_voice_session(
                audio_id,
                transcript_id,
                session.transcript.as_ref().map(|t| t.session_uuid.as_str()),
                &self.device,
                session.success,
                &session.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            )?;

            stats.sessions += 1;
            match (&session.audio, &session.transcript) {
                (Some(_), Some(_)) => stats.linked += 1,
                (None, Some(_)) => stats.orphans += 1,
                _ => {}
            }
        }
        tx.commit()?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn audio_at(s: &str) -> AudioCapture {
        AudioCapture {
            file_path: format!("/audio/{}.wav", s),
            filename: format!("{}.wav", s),
            original_filename: "capture.wav".to_string(),
            timestamp: ts(s),
            duration_seconds: None,
            format: "wav".to_string(),
            size_bytes: 1024,
            source_project: "recordings".to_string(),
        }
    }

    fn transcript_at(s: &str, words: i64) -> TranscriptCapture {
        TranscriptCapture {
            file_path: format!("/transcripts/{}.txt", s),
            filename: format!("{}.txt", s),
            content: if words > 0 { "some words".to_string() } else { String::new() },
            word_count: words,
            session_uuid: "abc-123".to_string(),
            timestamp: ts(s),
            size_bytes: 16,
            source_project: "transcripts".to_string(),
        }
    }

    #[test]
    fn test_parse_audio_filename() {
        let (timestamp, label, ext) =
            parse_audio_filename("20250114_120000_recording.wav").unwrap();
        assert_eq!(timestamp, ts("2025-01-14 12:00:00"));
        assert_eq!(label, "recording");
        assert_eq!(ext, "wav");

        assert!(parse_audio_filename("20250114_120000_clip.ogg").is_none());
        assert!(parse_audio_filename("not_a_capture.wav").is_none());
    }

    #[test]
    fn test_parse_transcript_filename() {
        let (timestamp, uuid) =
            parse_transcript_filename("20250114_120030_0a1b2c3d-e4f5.txt").unwrap();
        assert_eq!(timestamp, ts("2025-01-14 12:00:30"));
        assert_eq!(uuid, "0a1b2c3d-e4f5");

        assert!(parse_transcript_filename("20250114_120030_notes!.txt").is_none());
    }

    #[test]
    fn test_links_nearest_within_window() {
        let audio = vec![audio_at("2025-01-14 12:00:00")];
        let transcripts = vec![
            transcript_at("2025-01-14 12:00:30", 5),
            transcript_at("2025-01-14 12:05:00", 5),
        ];

        let sessions = link_sessions(audio, transcripts, 60);
        assert_eq!(sessions.len(), 2);

        // Audio pairs with the 30s-away transcript
        assert!(sessions[0].audio.is_some());
        let linked = sessions[0].transcript.as_ref().unwrap();
        assert_eq!(linked.timestamp, ts("2025-01-14 12:00:30"));
        assert!(sessions[0].success);

        // The far transcript is an orphan
        assert!(sessions[1].audio.is_none());
        let orphan = sessions[1].transcript.as_ref().unwrap();
        assert_eq!(orphan.timestamp, ts("2025-01-14 12:05:00"));
    }

    #[test]
    fn test_earlier_audio_steals_match() {
        // Greedy order-dependence: the first audio takes the shared transcript
        let audio = vec![
            audio_at("2025-01-14 12:00:00"),
            audio_at("2025-01-14 12:00:20"),
        ];
        let transcripts = vec![transcript_at("2025-01-14 12:00:10", 3)];

        let sessions = link_sessions(audio, transcripts, 60);
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].transcript.is_some());
        assert!(sessions[1].transcript.is_none());
        assert!(!sessions[1].success);
    }

    #[test]
    fn test_empty_transcript_is_not_success() {
        let audio = vec![audio_at("2025-01-14 12:00:00")];
        let transcripts = vec![transcript_at("2025-01-14 12:00:05", 0)];

        let sessions = link_sessions(audio, transcripts, 60);
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].transcript.is_some());
        assert!(!sessions[0].success);
    }

    #[test]
    fn test_unmatched_audio_emitted_alone() {
        let audio = vec![audio_at("2025-01-14 12:00:00")];
        let sessions = link_sessions(audio, Vec::new(), 60);
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].transcript.is_none());
        assert!(!sessions[0].success);
    }
}
