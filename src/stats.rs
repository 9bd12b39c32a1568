//! Index statistics and health overview.
//!
//! Summarizes what the last ingestion produced: when it ran, which provider
//! embedded it, per-category record counts, and on-disk file sizes. Used by
//! `sextant stats` to confirm an ingest worked before querying.

use anyhow::Result;

use crate::config::Config;
use crate::store::{self, COMPONENTS_FILE, GRAPH_FILE, INDEX_FILE, MANIFEST_FILE};

/// Run the stats command: read the manifest and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let dir = &config.data.dir;

    println!("Sextant — Index Stats");
    println!("=====================");
    println!();
    println!("  Data dir:    {}", dir.display());

    let manifest = match store::load_manifest(dir)? {
        Some(m) => m,
        None => {
            println!();
            println!("  No index yet. Run `sextant ingest`.");
            println!();
            return Ok(());
        }
    };

    let age = chrono::Utc::now()
        .signed_duration_since(manifest.generated_at)
        .num_seconds();
    println!("  Generated:   {}", format_age(age, manifest.generated_at.timestamp()));
    println!(
        "  Provider:    {} ({}, {} dims)",
        manifest.provider, manifest.model, manifest.dims
    );
    println!(
        "  Mode:        {}",
        if manifest.semantic { "semantic" } else { "local (keyword)" }
    );
    println!("  Repos:       {}", manifest.repos.join(", "));
    println!("  Components:  {}", manifest.components);
    println!("  Graph edges: {}", manifest.graph_edges);

    if !manifest.categories.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<20} {:>8}", "CATEGORY", "RECORDS");
        println!("  {}", "-".repeat(29));
        for (category, count) in &manifest.categories {
            println!("  {:<20} {:>8}", category, count);
        }
    }

    println!();
    println!("  Files:");
    for name in [INDEX_FILE, COMPONENTS_FILE, GRAPH_FILE, MANIFEST_FILE] {
        let size = std::fs::metadata(dir.join(name)).map(|m| m.len()).ok();
        match size {
            Some(bytes) => println!("  {:<20} {:>10}", name, format_bytes(bytes)),
            None => println!("  {:<20} {:>10}", name, "missing"),
        }
    }
    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Relative age ("3 hours ago"), or an absolute date past 30 days.
fn format_age(delta_secs: i64, ts: i64) -> String {
    if delta_secs < 0 {
        return format_ts_iso(ts);
    }

    if delta_secs < 60 {
        "just now".to_string()
    } else if delta_secs < 3600 {
        let mins = delta_secs / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta_secs < 86400 {
        let hours = delta_secs / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta_secs < 86400 * 30 {
        let days = delta_secs / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
