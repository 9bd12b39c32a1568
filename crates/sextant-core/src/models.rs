//! Core data models used throughout Sextant.
//!
//! These types are the strict, already-validated shapes that flow from the
//! ingestion boundary into the engines. Every optional field of the
//! persisted JSON is defaulted here (via serde) so downstream code never
//! re-checks optionality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Platform id for components that belong to no single platform.
pub const SHARED_PLATFORM: &str = "shared";

/// The four design axes a [`SemanticPosition`] is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    TerminalOrganic,
    MinimalDense,
    CoolWarm,
    StaticAnimated,
}

impl Axis {
    pub const ALL: [Axis; 4] = [
        Axis::TerminalOrganic,
        Axis::MinimalDense,
        Axis::CoolWarm,
        Axis::StaticAnimated,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Axis::TerminalOrganic => "terminal_organic",
            Axis::MinimalDense => "minimal_dense",
            Axis::CoolWarm => "cool_warm",
            Axis::StaticAnimated => "static_animated",
        }
    }

    pub fn from_id(id: &str) -> Option<Axis> {
        Axis::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Default pole labels `(negative, positive)`, used when a design space
    /// does not supply its own.
    pub fn poles(self) -> (&'static str, &'static str) {
        match self {
            Axis::TerminalOrganic => ("terminal", "organic"),
            Axis::MinimalDense => ("minimal", "dense"),
            Axis::CoolWarm => ("cool", "warm"),
            Axis::StaticAnimated => ("static", "animated"),
        }
    }
}

/// Coordinates of a component (or a query) in the 4-axis design space.
///
/// Each axis lives in `[-1, 1]`. Missing axes deserialize as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticPosition {
    pub terminal_organic: f64,
    pub minimal_dense: f64,
    pub cool_warm: f64,
    pub static_animated: f64,
}

impl SemanticPosition {
    pub fn new(terminal_organic: f64, minimal_dense: f64, cool_warm: f64, static_animated: f64) -> Self {
        Self {
            terminal_organic,
            minimal_dense,
            cool_warm,
            static_animated,
        }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::TerminalOrganic => self.terminal_organic,
            Axis::MinimalDense => self.minimal_dense,
            Axis::CoolWarm => self.cool_warm,
            Axis::StaticAnimated => self.static_animated,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::TerminalOrganic => self.terminal_organic = value,
            Axis::MinimalDense => self.minimal_dense = value,
            Axis::CoolWarm => self.cool_warm = value,
            Axis::StaticAnimated => self.static_animated = value,
        }
    }

    /// Clamp every axis into `[-1, 1]`.
    pub fn clamped(mut self) -> Self {
        for axis in Axis::ALL {
            self.set(axis, self.get(axis).clamp(-1.0, 1.0));
        }
        self
    }

    pub fn distance(&self, other: &SemanticPosition) -> f64 {
        Axis::ALL
            .iter()
            .map(|&a| {
                let d = self.get(a) - other.get(a);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Axis-wise linear interpolation: `ratio = 0` is `self`, `1` is `other`.
    pub fn lerp(&self, other: &SemanticPosition, ratio: f64) -> SemanticPosition {
        let mut out = SemanticPosition::default();
        for axis in Axis::ALL {
            let a = self.get(axis);
            out.set(axis, a + (other.get(axis) - a) * ratio);
        }
        out
    }
}

/// A position where any axis may be left unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialPosition {
    pub terminal_organic: Option<f64>,
    pub minimal_dense: Option<f64>,
    pub cool_warm: Option<f64>,
    pub static_animated: Option<f64>,
}

impl PartialPosition {
    /// Fill unspecified axes with `0.0`.
    pub fn resolve(&self) -> SemanticPosition {
        SemanticPosition {
            terminal_organic: self.terminal_organic.unwrap_or(0.0),
            minimal_dense: self.minimal_dense.unwrap_or(0.0),
            cool_warm: self.cool_warm.unwrap_or(0.0),
            static_animated: self.static_animated.unwrap_or(0.0),
        }
    }
}

/// A UI component as extracted from a source tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    /// `repo:name`.
    pub id: String,
    pub name: String,
    pub origin_repo: String,
    pub platform: String,
    /// Path relative to the repository root, `/`-separated.
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visual_characteristics: String,
    #[serde(default)]
    pub implementation_notes: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub anchors: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub related_components: Vec<String>,
    #[serde(default)]
    pub semantic_position: SemanticPosition,
    #[serde(default)]
    pub embedding_text: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub line_count: usize,
    #[serde(default = "epoch")]
    pub last_modified: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl ComponentRecord {
    /// Containing directory of the source file (`""` at the repo root).
    pub fn directory(&self) -> &str {
        match self.file_path.rfind('/') {
            Some(idx) => &self.file_path[..idx],
            None => "",
        }
    }

    /// Lower-cased text searched by keyword-mode scoring.
    pub fn keyword_haystack(&self) -> String {
        let mut parts: Vec<&str> = vec![
            &self.name,
            &self.platform,
            &self.description,
            &self.visual_characteristics,
        ];
        parts.extend(self.tokens.iter().map(String::as_str));
        parts.extend(self.patterns.iter().map(String::as_str));
        parts.extend(self.anchors.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }
}

/// A component together with its document embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedComponent {
    #[serde(flatten)]
    pub record: ComponentRecord,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// Kind of content a [`SemanticIndexRecord`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Philosophy,
    PlatformIdentity,
    Anchor,
    Pattern,
    Reference,
    Component,
    Fingerprint,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Philosophy,
        Category::PlatformIdentity,
        Category::Anchor,
        Category::Pattern,
        Category::Reference,
        Category::Component,
        Category::Fingerprint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Philosophy => "philosophy",
            Category::PlatformIdentity => "platform_identity",
            Category::Anchor => "anchor",
            Category::Pattern => "pattern",
            Category::Reference => "reference",
            Category::Component => "component",
            Category::Fingerprint => "fingerprint",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One embedded entry of the semantic index. Unique by [`key`](Self::key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticIndexRecord {
    pub category: Category,
    pub source_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub platform_tags: Vec<String>,
}

impl SemanticIndexRecord {
    pub fn key(&self) -> String {
        record_key(self.category, &self.source_id)
    }

    /// String list stored under `metadata[field]`, or empty.
    pub fn metadata_strings(&self, field: &str) -> Vec<String> {
        self.metadata
            .get(field)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Lower-cased text searched by keyword-mode scoring.
    pub fn keyword_haystack(&self) -> String {
        let mut text = format!("{} {} {}", self.source_id, self.title, self.content);
        for kw in self.metadata_strings("keywords") {
            text.push(' ');
            text.push_str(&kw);
        }
        text.to_lowercase()
    }
}

pub fn record_key(category: Category, source_id: &str) -> String {
    format!("{}:{}", category.as_str(), source_id)
}

/// Metadata shape of a `fingerprint` index record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FingerprintMetadata {
    version: String,
    identity_short: String,
    anchor_weights: BTreeMap<String, f64>,
    keywords: Vec<String>,
}

/// A platform's stored design identity, used for detection and drift.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFingerprint {
    pub platform: String,
    pub version: String,
    pub identity_short: String,
    pub identity_extended: String,
    pub anchor_weights: BTreeMap<String, f64>,
    pub keywords: Vec<String>,
    #[serde(skip)]
    pub identity_embedding: Vec<f32>,
}

impl PlatformFingerprint {
    /// Validate a `fingerprint` index record into its strict shape.
    ///
    /// The record's `sourceId` is the platform id and its `content` the
    /// extended identity text.
    pub fn from_record(record: &SemanticIndexRecord) -> Result<Self, String> {
        if record.category != Category::Fingerprint {
            return Err(format!("{} is not a fingerprint record", record.key()));
        }
        if record.source_id.trim().is_empty() {
            return Err("fingerprint record has an empty platform id".to_string());
        }
        let meta: FingerprintMetadata = if record.metadata.is_null() {
            FingerprintMetadata::default()
        } else {
            serde_json::from_value(record.metadata.clone())
                .map_err(|e| format!("{}: invalid metadata: {}", record.key(), e))?
        };
        if let Some((anchor, w)) = meta
            .anchor_weights
            .iter()
            .find(|(_, w)| !(0.0..=1.0).contains(*w))
        {
            return Err(format!(
                "{}: anchor weight for '{}' out of [0, 1]: {}",
                record.key(),
                anchor,
                w
            ));
        }
        Ok(Self {
            platform: record.source_id.clone(),
            version: meta.version,
            identity_short: if meta.identity_short.is_empty() {
                record.title.clone()
            } else {
                meta.identity_short
            },
            identity_extended: record.content.clone(),
            anchor_weights: meta.anchor_weights,
            keywords: meta.keywords,
            identity_embedding: record.embedding.clone(),
        })
    }

    pub fn keyword_haystack(&self) -> String {
        format!(
            "{} {} {} {}",
            self.platform,
            self.identity_short,
            self.identity_extended,
            self.keywords.join(" ")
        )
        .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_position_clamps_each_axis() {
        let p = SemanticPosition::new(1.7, -3.0, 0.2, -0.9).clamped();
        assert_eq!(p, SemanticPosition::new(1.0, -1.0, 0.2, -0.9));
    }

    #[test]
    fn test_position_missing_axis_defaults_to_zero() {
        let p: SemanticPosition = serde_json::from_value(json!({ "cool_warm": 0.5 })).unwrap();
        assert_eq!(p, SemanticPosition::new(0.0, 0.0, 0.5, 0.0));
    }

    #[test]
    fn test_max_distance_is_four() {
        let a = SemanticPosition::new(-1.0, -1.0, -1.0, -1.0);
        let b = SemanticPosition::new(1.0, 1.0, 1.0, 1.0);
        assert!((a.distance(&b) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = SemanticPosition::new(-1.0, 0.0, 0.5, 0.0);
        let b = SemanticPosition::new(1.0, 1.0, -0.5, 0.2);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert!((a.lerp(&b, 0.5).terminal_organic).abs() < 1e-12);
    }

    #[test]
    fn test_directory_of_root_file_is_empty() {
        let rec: ComponentRecord = serde_json::from_value(json!({
            "id": "r:A", "name": "A", "originRepo": "r", "platform": "shared", "filePath": "A.tsx"
        }))
        .unwrap();
        assert_eq!(rec.directory(), "");
        assert_eq!(rec.last_modified, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_fingerprint_from_record() {
        let rec = SemanticIndexRecord {
            category: Category::Fingerprint,
            source_id: "astrolabe".to_string(),
            title: "Astrolabe".to_string(),
            content: "Warm brass instruments, celestial charts".to_string(),
            embedding: vec![0.1, 0.2],
            metadata: json!({
                "version": "2",
                "anchorWeights": { "precision": 0.8 },
                "keywords": ["brass", "celestial"]
            }),
            platform_tags: vec!["astrolabe".to_string()],
        };
        let fp = PlatformFingerprint::from_record(&rec).unwrap();
        assert_eq!(fp.platform, "astrolabe");
        assert_eq!(fp.identity_short, "Astrolabe");
        assert_eq!(fp.anchor_weights["precision"], 0.8);
        assert_eq!(fp.identity_embedding, vec![0.1, 0.2]);
    }

    #[test]
    fn test_fingerprint_rejects_out_of_range_weight() {
        let rec = SemanticIndexRecord {
            category: Category::Fingerprint,
            source_id: "astrolabe".to_string(),
            title: String::new(),
            content: String::new(),
            embedding: vec![],
            metadata: json!({ "anchorWeights": { "precision": 1.5 } }),
            platform_tags: vec![],
        };
        assert!(PlatformFingerprint::from_record(&rec).is_err());
    }
}
