//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rackconf::{ConfigSources, RackConfig};
use rackwalk::{
    export, Annotations, Extractor, ExtractorSettings, ExtractionSummary, SnapshotAccessor,
};
use tracing::info;

pub enum ExportTarget {
    Stdout,
    File(PathBuf),
    Dir(PathBuf),
}

fn load_snapshot(path: &Path) -> Result<SnapshotAccessor> {
    SnapshotAccessor::from_path(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))
}

pub fn extract(
    config: &RackConfig,
    snapshot: &Path,
    track: usize,
    device: usize,
    annotations: Annotations,
    target: ExportTarget,
) -> Result<()> {
    let accessor = load_snapshot(snapshot)?;
    let settings = ExtractorSettings {
        max_depth: config.extraction.max_depth,
        extractor_version: config.extraction.extractor_version.clone(),
    };

    let mut extractor = Extractor::new(accessor, settings);
    extractor.set_annotations(annotations);
    let document = extractor
        .extract(track, device)
        .with_context(|| format!("Extraction of track {} device {} failed", track, device))?;

    let pretty = config.export.pretty;
    match target {
        ExportTarget::Stdout => {
            println!("{}", export::to_json(document, pretty)?);
        }
        ExportTarget::File(path) => {
            export::write_export(document, &path, pretty)?;
            println!("Exported {} to {}", document.root().name, path.display());
            print_summary(&document.summary());
        }
        ExportTarget::Dir(dir) => {
            let path = export::write_export_to_dir(document, &dir, pretty)?;
            println!("Exported {} to {}", document.root().name, path.display());
            print_summary(&document.summary());
        }
    }

    Ok(())
}

pub fn diagnose(snapshot: &Path, json: bool) -> Result<()> {
    let accessor = load_snapshot(snapshot)?;
    let overview = rackwalk::diagnose(&accessor).context("Failed to inspect live set")?;
    info!(tracks = overview.track_count, "diagnosed live set");

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(());
    }

    println!("{} track(s)", overview.track_count);
    for track in &overview.tracks {
        match &track.error {
            Some(error) => println!("  [{}] {} (error: {})", track.index, track.name, error),
            None => println!(
                "  [{}] {} ({} device(s))",
                track.index, track.name, track.device_count
            ),
        }
        for device in &track.devices {
            let kind = if device.is_rack { "rack" } else { "device" };
            match &device.error {
                Some(error) => {
                    println!("      {}: {} (error: {})", device.index, device.name, error)
                }
                None => println!("      {}: {} [{}]", device.index, device.name, kind),
            }
        }
    }
    if overview.tracks.len() < overview.track_count {
        println!(
            "  ... {} more track(s)",
            overview.track_count - overview.tracks.len()
        );
    }

    Ok(())
}

pub fn summary(path: &Path) -> Result<()> {
    let document = export::read_export(path)
        .with_context(|| format!("Failed to read export {}", path.display()))?;

    let metadata = &document.metadata;
    let root = document.root();
    println!("{} ({})", root.name, root.node_type.as_str());
    println!("  path:      {}", root.path);
    println!("  extracted: {}", metadata.extracted_at);
    println!("  version:   {}", metadata.extractor_version);
    print_annotations(&metadata.annotations);
    print_summary(&document.summary());

    Ok(())
}

fn print_annotations(annotations: &Annotations) {
    if annotations.is_empty() {
        println!("  annotations: none");
        return;
    }
    if !annotations.tags.is_empty() {
        println!("  tags:      {}", annotations.tags.join(", "));
    }
    if let Some(difficulty) = annotations.difficulty {
        println!("  level:     {}", difficulty);
    }
    for (label, text) in [
        ("use case", &annotations.use_case),
        ("category", &annotations.category),
        ("genre", &annotations.genre),
    ] {
        if !text.is_empty() {
            println!("  {:<10} {}", format!("{}:", label), text);
        }
    }
}

fn print_summary(summary: &ExtractionSummary) {
    println!(
        "  chains: {}  devices: {}  parameters: {}  macros: {}",
        summary.chains, summary.devices, summary.parameters, summary.macros
    );
    println!(
        "  errors: {}  circular: {}  depth exceeded: {}  max depth: {}",
        summary.errors, summary.circular, summary.depth_exceeded, summary.max_depth
    );
}

pub fn show_config(config: &RackConfig, sources: &ConfigSources) {
    if sources.files.is_empty() {
        println!("# no config files loaded, using defaults");
    }
    for file in &sources.files {
        println!("# loaded {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# overridden by ${}", var);
    }
    print!("{}", config.to_toml());
}
