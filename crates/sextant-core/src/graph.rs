//! Component relationship graph.
//!
//! Built by pairwise comparison of extracted records (O(n²), fine for a few
//! hundred components):
//!
//! - `imports` — directed, `A → B` when one of A's imports names B.
//! - `shares-<pattern>` — undirected, one per unordered pair and shared pattern.
//! - `sibling` — undirected, one per unordered pair living in the same
//!   directory on the same platform.
//!
//! After all edges exist each record's `related_components` is backfilled
//! with every component it touches.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::models::ComponentRecord;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Relationship {
    Imports,
    Shares(String),
    Sibling,
}

impl Relationship {
    pub fn is_directed(&self) -> bool {
        matches!(self, Relationship::Imports)
    }

    /// Label without the pattern suffix (`imports`, `shares`, `sibling`).
    pub fn kind(&self) -> &'static str {
        match self {
            Relationship::Imports => "imports",
            Relationship::Shares(_) => "shares",
            Relationship::Sibling => "sibling",
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relationship::Imports => f.write_str("imports"),
            Relationship::Shares(p) => write!(f, "shares-{}", p),
            Relationship::Sibling => f.write_str("sibling"),
        }
    }
}

impl From<Relationship> for String {
    fn from(r: Relationship) -> String {
        r.to_string()
    }
}

impl TryFrom<String> for Relationship {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "imports" => Ok(Relationship::Imports),
            "sibling" => Ok(Relationship::Sibling),
            other => match other.strip_prefix("shares-") {
                Some(p) if !p.is_empty() => Ok(Relationship::Shares(p.to_string())),
                _ => Err(format!("unknown relationship: {}", other)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub platform: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relationship: Relationship,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ComponentGraph {
    /// Edges touching `id` in either direction.
    pub fn edges_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == id || e.target == id)
    }

    pub fn count_by_kind(&self, kind: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.relationship.kind() == kind)
            .count()
    }
}

/// Strip directories, extensions and a trailing `index` from an import
/// specifier: `../hud/Frame.module.css` → `Frame`, `./Panel/index` → `Panel`.
fn import_basename(import: &str) -> &str {
    let trimmed = import.trim_end_matches('/');
    let mut segments = trimmed.rsplit('/');
    let last = segments.next().unwrap_or("");
    let stem = last.split('.').next().unwrap_or("");
    if stem == "index" {
        segments
            .next()
            .map(|s| s.split('.').next().unwrap_or(s))
            .unwrap_or(stem)
    } else {
        stem
    }
}

fn path_stem(file_path: &str) -> &str {
    let name_start = file_path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match file_path[name_start..].find('.') {
        Some(dot) => &file_path[..name_start + dot],
        None => file_path,
    }
}

/// Whether `import` textually references `target` by name or path.
pub fn import_references(import: &str, target: &ComponentRecord) -> bool {
    let base = import_basename(import);
    if !base.is_empty() && base.eq_ignore_ascii_case(&target.name) {
        return true;
    }
    let cleaned = import
        .trim_start_matches("./")
        .trim_start_matches("../")
        .trim_start_matches("@/")
        .trim_start_matches('~');
    let cleaned = path_stem(cleaned);
    cleaned.contains('/') && path_stem(&target.file_path).ends_with(cleaned)
}

/// Build the relationship graph and backfill `related_components`.
pub fn build_graph(records: &mut [ComponentRecord]) -> ComponentGraph {
    let nodes = records
        .iter()
        .map(|r| GraphNode {
            id: r.id.clone(),
            platform: r.platform.clone(),
            node_type: r.file_type.clone(),
        })
        .collect();

    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut seen: HashSet<(usize, usize, Relationship)> = HashSet::new();
    let mut push = |edges: &mut Vec<GraphEdge>, a: usize, b: usize, rel: Relationship| {
        let key = if rel.is_directed() || a < b {
            (a, b, rel.clone())
        } else {
            (b, a, rel.clone())
        };
        if seen.insert(key.clone()) {
            edges.push(GraphEdge {
                source: records[key.0].id.clone(),
                target: records[key.1].id.clone(),
                relationship: rel,
            });
        }
    };

    for i in 0..records.len() {
        for j in 0..records.len() {
            if i == j {
                continue;
            }
            let (a, b) = (&records[i], &records[j]);

            if a.imports.iter().any(|imp| import_references(imp, b)) {
                push(&mut edges, i, j, Relationship::Imports);
            }

            if i < j {
                for pattern in a.patterns.iter().filter(|p| b.patterns.contains(p)) {
                    push(&mut edges, i, j, Relationship::Shares(pattern.clone()));
                }
                if a.platform == b.platform && a.directory() == b.directory() {
                    push(&mut edges, i, j, Relationship::Sibling);
                }
            }
        }
    }

    let mut related: Vec<BTreeSet<String>> = vec![BTreeSet::new(); records.len()];
    for edge in &edges {
        let src = records.iter().position(|r| r.id == edge.source);
        let tgt = records.iter().position(|r| r.id == edge.target);
        if let (Some(s), Some(t)) = (src, tgt) {
            related[s].insert(edge.target.clone());
            related[t].insert(edge.source.clone());
        }
    }
    for (record, rel) in records.iter_mut().zip(related) {
        record.related_components = rel.into_iter().collect();
    }

    ComponentGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SemanticPosition;
    use chrono::Utc;

    fn record(name: &str, path: &str, platform: &str) -> ComponentRecord {
        ComponentRecord {
            id: format!("repo:{}", name),
            name: name.to_string(),
            origin_repo: "repo".to_string(),
            platform: platform.to_string(),
            file_path: path.to_string(),
            description: String::new(),
            visual_characteristics: String::new(),
            implementation_notes: String::new(),
            imports: vec![],
            tokens: vec![],
            patterns: vec![],
            anchors: vec![],
            rules: vec![],
            related_components: vec![],
            semantic_position: SemanticPosition::default(),
            embedding_text: String::new(),
            file_type: "tsx".to_string(),
            line_count: 10,
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn test_graph_import_share_sibling() {
        let mut x = record("X", "src/hud/X.tsx", "astrolabe");
        x.imports = vec!["../panels/Y".to_string()];
        let mut y = record("Y", "src/panels/Y.tsx", "astrolabe");
        y.patterns = vec!["breathing".to_string()];
        let mut z = record("Z", "src/hud/Z.tsx", "astrolabe");
        z.patterns = vec!["breathing".to_string()];

        let mut records = vec![x, y, z];
        let graph = build_graph(&mut records);

        let imports: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.relationship == Relationship::Imports)
            .collect();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].source, "repo:X");
        assert_eq!(imports[0].target, "repo:Y");

        let shares: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.relationship == Relationship::Shares("breathing".to_string()))
            .collect();
        assert_eq!(shares.len(), 1);
        assert_eq!(
            (shares[0].source.as_str(), shares[0].target.as_str()),
            ("repo:Y", "repo:Z")
        );

        let siblings: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.relationship == Relationship::Sibling)
            .collect();
        assert_eq!(siblings.len(), 1);
        assert_eq!(
            (siblings[0].source.as_str(), siblings[0].target.as_str()),
            ("repo:X", "repo:Z")
        );

        assert_eq!(graph.edges.len(), 3);
        assert_eq!(records[0].related_components, vec!["repo:Y", "repo:Z"]);
        assert_eq!(records[1].related_components, vec!["repo:X", "repo:Z"]);
    }

    #[test]
    fn test_siblings_require_same_platform() {
        let mut records = vec![
            record("A", "src/A.tsx", "astrolabe"),
            record("B", "src/B.tsx", "shared"),
        ];
        let graph = build_graph(&mut records);
        assert!(graph.edges.is_empty());
        assert!(records[0].related_components.is_empty());
    }

    #[test]
    fn test_mutual_imports_are_two_directed_edges() {
        let mut a = record("A", "src/a/A.tsx", "p");
        a.imports = vec!["../b/B".to_string()];
        let mut b = record("B", "src/b/B.tsx", "p");
        b.imports = vec!["../a/A".to_string()];
        let mut records = vec![a, b];
        let graph = build_graph(&mut records);
        assert_eq!(graph.count_by_kind("imports"), 2);
    }

    #[test]
    fn test_import_references_variants() {
        let target = record("Frame", "src/components/hud/Frame.tsx", "p");
        assert!(import_references("./Frame", &target));
        assert!(import_references("../hud/Frame.module.css", &target));
        assert!(import_references("@/components/hud/Frame", &target));
        assert!(!import_references("./FrameGroup", &target));
        assert!(!import_references("react", &target));

        let indexed = record("Panel", "src/Panel/index.tsx", "p");
        assert!(import_references("./Panel/index", &indexed));
    }

    #[test]
    fn test_relationship_string_round_trip() {
        let rel: Relationship = serde_json::from_str("\"shares-glass-blur\"").unwrap();
        assert_eq!(rel, Relationship::Shares("glass-blur".to_string()));
        assert_eq!(serde_json::to_string(&rel).unwrap(), "\"shares-glass-blur\"");
        assert!(serde_json::from_str::<Relationship>("\"shares-\"").is_err());
    }
}
