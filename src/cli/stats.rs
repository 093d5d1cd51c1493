//! Stats command implementation

use anyhow::Result;

use crate::store::DatalakeStore;

pub fn run(store: &DatalakeStore) -> Result<()> {
    let stats = store.stats()?;

    println!("Datalake contents:\n");
    println!("ChatGPT:");
    println!("   {} imports", stats.imports);
    println!("   {} conversations", stats.conversations);
    println!("   {} messages", stats.conversation_messages);
    println!("Claude Code:");
    println!("   {} sessions", stats.sessions);
    println!("   {} messages", stats.session_messages);
    println!("   {} subagent logs", stats.subagents);
    println!("   {} history entries", stats.history_entries);
    println!("Voice:");
    println!("   {} audio files", stats.audio_files);
    println!("   {} transcripts", stats.transcripts);
    println!("   {} sessions", stats.voice_sessions);
    println!("Memory telemetry:");
    println!("   {} metrics", stats.memory_metrics);
    println!("   {} events", stats.memory_events);
    Ok(())
}
