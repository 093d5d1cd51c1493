//! ChatGPT export import command

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::source::chatgpt::ChatGptImporter;
use crate::store::DatalakeStore;

pub fn run(store: &DatalakeStore, config: &Config, zip_path: &Path) -> Result<()> {
    println!("Importing ChatGPT export: {}\n", zip_path.display());

    let importer = ChatGptImporter::new(store, config.data_dir(), &config.device);
    let stats = importer.import_from_zip(zip_path)?;

    if stats.duplicate_archive {
        println!("Archive already imported, nothing to do.");
        return Ok(());
    }

    println!("   {} new conversations", stats.conversations_new);
    println!("   {} updated", stats.conversations_updated);
    println!("   {} already current", stats.conversations_skipped);
    println!("   {} messages", stats.messages_imported);
    println!("\n✅ Import complete!");
    Ok(())
}
