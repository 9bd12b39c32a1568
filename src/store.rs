//! JSON persistence for the ingestion output and the serving-side loader.
//!
//! ```text
//! <data.dir>/
//! ├── index.json        SemanticIndexRecord[]
//! ├── components.json   EmbeddedComponent[]
//! ├── graph.json        ComponentGraph
//! └── manifest.json     Manifest
//! ```
//!
//! Writes go through [`write_snapshot`]: every file is first serialized to a
//! `*.tmp` sibling, and the temp files are swapped in only once all of them
//! are on disk. The swap itself is per-file renames; each replaced file is
//! kept as `*.bak` until every rename succeeded, and a failed rename puts
//! the backups back, so a failed run leaves the previous snapshot in place.
//!
//! Reads go through [`load_catalog`], which never fails: a missing or
//! unparsable file is logged and replaced by an empty collection, and the
//! engines answer with empty or neutral results.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sextant_core::design_space::DesignSpace;
use sextant_core::graph::ComponentGraph;
use sextant_core::index::SemanticIndex;
use sextant_core::models::{EmbeddedComponent, SemanticIndexRecord};
use sextant_core::Catalog;

use crate::config::Config;

pub const INDEX_FILE: &str = "index.json";
pub const COMPONENTS_FILE: &str = "components.json";
pub const GRAPH_FILE: &str = "graph.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub dims: usize,
    /// `false` when the run stored empty embeddings (keyword mode).
    pub semantic: bool,
    pub components: usize,
    /// Index record count per category.
    pub categories: BTreeMap<String, usize>,
    pub graph_edges: usize,
    pub repos: Vec<String>,
}

/// Everything one ingestion run persists.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub index: Vec<SemanticIndexRecord>,
    pub components: Vec<EmbeddedComponent>,
    pub graph: ComponentGraph,
    pub manifest: Manifest,
}

/// Atomically replace the snapshot in `dir`.
pub fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data dir: {}", dir.display()))?;

    let files = [
        (INDEX_FILE, serde_json::to_string_pretty(&snapshot.index)?),
        (COMPONENTS_FILE, serde_json::to_string_pretty(&snapshot.components)?),
        (GRAPH_FILE, serde_json::to_string_pretty(&snapshot.graph)?),
        (MANIFEST_FILE, serde_json::to_string_pretty(&snapshot.manifest)?),
    ];

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
    for (name, body) in &files {
        let target = dir.join(name);
        let tmp = dir.join(format!("{}.tmp", name));
        if let Err(e) = std::fs::write(&tmp, body) {
            discard(&staged);
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("Failed to write {}", tmp.display()));
        }
        staged.push((tmp, target));
    }

    let mut swapped: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(staged.len());
    for (i, (tmp, target)) in staged.iter().enumerate() {
        match swap_in(tmp, target) {
            Ok(backup) => swapped.push((target.as_path(), backup)),
            Err(e) => {
                roll_back(&swapped);
                discard(&staged[i..]);
                return Err(e);
            }
        }
    }

    for (target, backup) in &swapped {
        if let Some(backup) = backup {
            let _ = std::fs::remove_file(backup);
        }
        tracing::info!("wrote {}", target.display());
    }
    Ok(())
}

fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Move `tmp` onto `target`, keeping any existing `target` as a backup.
fn swap_in(tmp: &Path, target: &Path) -> Result<Option<PathBuf>> {
    let backup = if target.exists() {
        let backup = backup_path(target);
        std::fs::rename(target, &backup)
            .with_context(|| format!("Failed to back up {}", target.display()))?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = std::fs::rename(tmp, target) {
        if let Some(backup) = &backup {
            let _ = std::fs::rename(backup, target);
        }
        return Err(e).with_context(|| format!("Failed to move {} into place", target.display()));
    }
    Ok(backup)
}

/// Undo completed swaps, newest first.
fn roll_back(swapped: &[(&Path, Option<PathBuf>)]) {
    for (target, backup) in swapped.iter().rev() {
        let restored = match backup {
            Some(backup) => std::fs::rename(backup, target),
            None => std::fs::remove_file(target),
        };
        if let Err(e) = restored {
            tracing::warn!("could not restore {}: {}", target.display(), e);
        }
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = std::fs::remove_file(tmp);
    }
}

/// Strict design-space loader used by ingestion.
pub fn load_design_space(path: &Path) -> Result<DesignSpace> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read design space: {}", path.display()))?;
    let space: DesignSpace = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse design space: {}", path.display()))?;
    space
        .validate()
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
    Ok(space)
}

pub fn load_manifest(dir: &Path) -> Result<Option<Manifest>> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(manifest))
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("{} unavailable ({}); starting with an empty set", path.display(), e);
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("{} is not valid ({}); starting with an empty set", path.display(), e);
            T::default()
        }
    }
}

/// Load everything the engines need. Never fails; see the module docs.
pub fn load_catalog(config: &Config) -> Catalog {
    let dir = &config.data.dir;
    let records: Vec<SemanticIndexRecord> = load_or_default(&dir.join(INDEX_FILE));
    let components: Vec<EmbeddedComponent> = load_or_default(&dir.join(COMPONENTS_FILE));
    let graph: ComponentGraph = load_or_default(&dir.join(GRAPH_FILE));

    let design_space = match load_design_space(&config.data.design_space) {
        Ok(space) => space,
        Err(e) => {
            tracing::warn!("{:#}; using an empty design space", e);
            DesignSpace::default()
        }
    };

    tracing::info!(
        "loaded {} index records, {} components, {} edges, {} platforms",
        records.len(),
        components.len(),
        graph.edges.len(),
        design_space.platforms.len()
    );

    Catalog::new(
        SemanticIndex::from_records(records),
        components,
        design_space,
        graph,
    )
}
