//! Claude Code session import command

use anyhow::Result;

use crate::config::Config;
use crate::source::claude::ClaudeImporter;
use crate::store::DatalakeStore;

pub fn run(store: &DatalakeStore, config: &Config) -> Result<()> {
    let claude_dir = config.claude_dir();
    println!("Importing Claude Code data from {}\n", claude_dir.display());

    let importer = ClaudeImporter::new(store, claude_dir, &config.device);
    let stats = importer.run()?;

    println!("   {} new history entries", stats.history_entries);
    println!("   {} new sessions", stats.sessions_new);
    println!("   {} updated", stats.sessions_updated);
    println!("   {} already current", stats.sessions_skipped);
    println!("   {} messages", stats.messages_imported);
    println!("   {} subagent logs", stats.subagents);
    println!("\n✅ Import complete!");
    Ok(())
}
