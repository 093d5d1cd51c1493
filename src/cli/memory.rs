//! Memory telemetry import command

use anyhow::Result;

use crate::config::Config;
use crate::source::memory::MemoryImporter;
use crate::store::DatalakeStore;

pub fn run(store: &DatalakeStore, config: &Config) -> Result<()> {
    let log_dir = config.memory_log_dir();
    println!("Importing memory telemetry from {}\n", log_dir.display());

    let importer = MemoryImporter::new(store, log_dir, &config.device);
    let stats = importer.run()?;

    println!("   {} new metrics", stats.metrics_ingested);
    println!("   {} new events", stats.events_ingested);
    println!("\n✅ Import complete!");
    Ok(())
}
