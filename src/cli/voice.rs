//! Voice recording and transcript import command

use anyhow::Result;

use crate::config::Config;
use crate::source::voice::VoiceImporter;
use crate::store::DatalakeStore;

pub fn run(store: &DatalakeStore, config: &Config) -> Result<()> {
    println!("Importing voice recordings and transcripts...\n");

    let importer = VoiceImporter::new(store, &config.device);
    let stats = importer.run(
        &config.audio_dirs(),
        &config.transcript_dirs(),
        config.voice.link_tolerance_seconds,
    )?;

    println!("   {} audio files", stats.audio_files);
    println!("   {} transcripts", stats.transcripts);
    println!(
        "   {} sessions ({} linked, {} orphan transcripts)",
        stats.sessions, stats.linked, stats.orphans
    );
    println!("\n✅ Import complete!");
    Ok(())
}
