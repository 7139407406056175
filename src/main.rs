//! Markup Inspect.
//!
//! Liest ein Markierungs-Dokument, dekodiert es und gibt die normalisierte Form aus.

use anyhow::{Context, Result};
use markup_engine::{parse_marking_document, write_marking_document, EngineOptions};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Logger initialisieren
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Markup Inspect v{} startet...", env!("CARGO_PKG_VERSION"));

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        anyhow::bail!("Aufruf: markup-inspect <marking.xml>");
    };

    let options = EngineOptions::load_from_file(&EngineOptions::config_path());
    let xml_content = std::fs::read_to_string(&path)
        .with_context(|| format!("Datei {} nicht lesbar", path.display()))?;
    let (marking, report) = parse_marking_document(&xml_content, options)
        .with_context(|| format!("{} ist kein gueltiges Markierungs-Dokument", path.display()))?;

    if report.errors > 0 {
        log::warn!("{} Entities verworfen", report.errors);
    }
    log::info!(
        "{} {}: {} Punkte, {} Linien, {} Ueberwege, {} Fuellungen",
        marking.kind(),
        marking.id(),
        marking.point_count(),
        marking.line_count(),
        marking.crosswalk_count(),
        marking.filler_count()
    );

    println!("{}", write_marking_document(&marking));
    Ok(())
}
