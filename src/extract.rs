//! Component extraction from configured source trees.
//!
//! Walks every `[repos.<name>]` root (or its allow-listed `dirs`), keeps the
//! files matching `extract.include_globs`, and turns each file into a
//! [`ComponentRecord`] using the regex heuristics in [`crate::heuristics`].
//!
//! Extraction never aborts on a single file: missing roots, unreadable
//! files, and duplicate component ids are logged with `warn!` and skipped.
//! Output is sorted by component id for deterministic runs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use sextant_core::design_space::DesignSpace;
use sextant_core::models::{Axis, ComponentRecord, SemanticPosition};
use sextant_core::position::derive_position;

use crate::config::{Config, ExtractConfig, RepoConfig};
use crate::heuristics::{self, PlatformMatcher};

/// Axis values at or beyond this magnitude are named in the embedding text.
pub const EXTREME_AXIS: f64 = 0.5;

const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/target/**",
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
];

/// Turns single source files into component records.
pub struct ComponentExtractor<'a> {
    space: &'a DesignSpace,
    matcher: PlatformMatcher,
    large_file_lines: usize,
}

impl<'a> ComponentExtractor<'a> {
    pub fn new(space: &'a DesignSpace, extract: &ExtractConfig) -> Self {
        Self {
            space,
            matcher: PlatformMatcher::new(&space.platforms),
            large_file_lines: extract.large_file_lines,
        }
    }

    /// Build the record for one file. `relative_path` is `/`-separated and
    /// relative to the repo root.
    pub fn extract_file(
        &self,
        repo: &str,
        relative_path: &str,
        text: &str,
        last_modified: DateTime<Utc>,
    ) -> ComponentRecord {
        let name = component_name(relative_path);
        let file_type = Path::new(relative_path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let line_count = text.lines().count();

        let tokens = heuristics::detect_tokens(text);
        let patterns = heuristics::detect_patterns(text);
        let imports = heuristics::detect_imports(text);
        let header = heuristics::parse_doc_header(text);
        let platform = self.matcher.resolve(relative_path, text);

        let signals = heuristics::detect_signals(text, &patterns, line_count, self.large_file_lines);
        let bias = self.space.platform(&platform).map(|p| &p.canonical_position);
        let semantic_position = derive_position(&signals, bias);
        tracing::debug!(
            "{}:{} platform={} signals={:?}",
            repo,
            relative_path,
            platform,
            signals
        );

        let description = header.description.unwrap_or_else(|| {
            format!("{} component for the {} platform.", name, platform)
        });
        let visual_characteristics = self.describe_visuals(&patterns, &semantic_position);
        let implementation_notes = if imports.is_empty() {
            format!("{} file, {} lines.", file_type, line_count)
        } else {
            format!(
                "{} file, {} lines. Imports {}.",
                file_type,
                line_count,
                imports.join(", ")
            )
        };

        let mut record = ComponentRecord {
            id: format!("{}:{}", repo, name),
            name,
            origin_repo: repo.to_string(),
            platform,
            file_path: relative_path.to_string(),
            description,
            visual_characteristics,
            implementation_notes,
            imports,
            tokens,
            patterns,
            anchors: header.anchors,
            rules: header.rules,
            related_components: Vec::new(),
            semantic_position,
            embedding_text: String::new(),
            file_type,
            line_count,
            last_modified,
        };
        record.embedding_text = self.embedding_text(&record);
        record
    }

    fn extreme_phrases(&self, pos: &SemanticPosition) -> Vec<String> {
        Axis::ALL
            .iter()
            .filter_map(|&axis| {
                let v = pos.get(axis);
                if v >= EXTREME_AXIS {
                    Some(format!("strongly {}", self.space.pole_label(axis, true)))
                } else if v <= -EXTREME_AXIS {
                    Some(format!("strongly {}", self.space.pole_label(axis, false)))
                } else {
                    None
                }
            })
            .collect()
    }

    fn describe_visuals(&self, patterns: &[String], pos: &SemanticPosition) -> String {
        let mut parts = Vec::new();
        if !patterns.is_empty() {
            parts.push(format!("Uses {}", patterns.join(", ")));
        }
        let extremes = self.extreme_phrases(pos);
        if !extremes.is_empty() {
            parts.push(format!("reads as {}", extremes.join(", ")));
        }
        if parts.is_empty() {
            "Neutral styling with no distinctive patterns.".to_string()
        } else {
            format!("{}.", parts.join("; "))
        }
    }

    /// Synthesized text that gets embedded. Never includes raw source.
    fn embedding_text(&self, r: &ComponentRecord) -> String {
        let mut lines = vec![
            format!("{} ({} platform)", r.name, r.platform),
            r.description.clone(),
            r.visual_characteristics.clone(),
        ];
        if !r.tokens.is_empty() {
            lines.push(format!("Tokens: {}", r.tokens.join(", ")));
        }
        if !r.patterns.is_empty() {
            lines.push(format!("Patterns: {}", r.patterns.join(", ")));
        }
        if !r.anchors.is_empty() {
            lines.push(format!("Anchors: {}", r.anchors.join(", ")));
        }
        let extremes = self.extreme_phrases(&r.semantic_position);
        if !extremes.is_empty() {
            lines.push(format!("Character: {}", extremes.join(", ")));
        }
        lines.join("\n")
    }
}

/// Component name from a file path: the file stem without a `.module`
/// suffix; `index.*` files take their directory's name.
pub fn component_name(relative_path: &str) -> String {
    let path = Path::new(relative_path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = stem.strip_suffix(".module").unwrap_or(&stem).to_string();
    if stem == "index" {
        if let Some(dir) = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
        {
            return dir;
        }
    }
    stem
}

/// Extract every component of every configured repo.
pub fn extract_components(config: &Config, space: &DesignSpace) -> Result<Vec<ComponentRecord>> {
    let include_set = build_globset(&config.extract.include_globs)?;
    let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    excludes.extend(config.extract.exclude_globs.clone());
    let exclude_set = build_globset(&excludes)?;

    let extractor = ComponentExtractor::new(space, &config.extract);
    let mut records: Vec<ComponentRecord> = Vec::new();

    for (repo_name, repo) in &config.repos {
        let before = records.len();
        for (relative, path) in scan_repo(repo_name, repo, &include_set, &exclude_set) {
            let text = match std::fs::read_to_string(&path) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

            let record = extractor.extract_file(repo_name, &relative, &text, modified);
            if let Some(existing) = records.iter().find(|r| r.id == record.id) {
                tracing::warn!(
                    "duplicate component id '{}' ({} and {}); keeping the first",
                    record.id,
                    existing.file_path,
                    record.file_path
                );
                continue;
            }
            records.push(record);
        }
        tracing::info!("{}: {} components", repo_name, records.len() - before);
    }

    records.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(records)
}

/// `(relative_path, absolute_path)` of every matching file, sorted.
fn scan_repo(
    name: &str,
    repo: &RepoConfig,
    include_set: &GlobSet,
    exclude_set: &GlobSet,
) -> Vec<(String, std::path::PathBuf)> {
    let root = &repo.root;
    if !root.exists() {
        tracing::warn!("repo '{}' root does not exist: {}", name, root.display());
        return Vec::new();
    }

    let starts: Vec<std::path::PathBuf> = if repo.dirs.is_empty() {
        vec![root.clone()]
    } else {
        repo.dirs.iter().map(|d| root.join(d)).collect()
    };

    let mut files = Vec::new();
    for start in starts {
        if !start.exists() {
            tracing::warn!("repo '{}' dir does not exist: {}", name, start.display());
            continue;
        }
        for entry in WalkDir::new(&start).follow_links(repo.follow_symlinks) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("repo '{}': {}", name, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().replace('\\', "/");

            if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
                continue;
            }
            files.push((rel_str, path.to_path_buf()));
        }
    }

    files.sort();
    files.dedup_by(|a, b| a.0 == b.0);
    files
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
