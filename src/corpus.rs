//! Seed documents ingested next to the extracted components.
//!
//! The corpus file is JSON:
//!
//! ```json
//! {
//!   "documents": [
//!     {
//!       "category": "fingerprint",
//!       "id": "sentinel",
//!       "title": "Sentinel",
//!       "content": "Vigilant, terminal-first threat surfaces ...",
//!       "platforms": ["sentinel"],
//!       "metadata": { "version": "2", "anchorWeights": { "vigilance": 0.9 } }
//!     }
//!   ]
//! }
//! ```
//!
//! Categories are every [`Category`] except `component`, which only the
//! extractor produces. Fingerprints are checked against their strict shape
//! here so a bad corpus fails ingestion instead of silently losing drift
//! scoring at serve time.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use sextant_core::design_space::DesignSpace;
use sextant_core::models::{Category, PlatformFingerprint, SemanticIndexRecord};

#[derive(Debug, Clone, Deserialize)]
pub struct SeedDocument {
    pub category: Category,
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl SeedDocument {
    /// Text sent to the embedding provider.
    pub fn embedding_text(&self) -> String {
        if self.title.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n{}", self.title, self.content)
        }
    }

    pub fn into_record(self, embedding: Vec<f32>) -> SemanticIndexRecord {
        SemanticIndexRecord {
            category: self.category,
            title: if self.title.is_empty() {
                self.id.clone()
            } else {
                self.title
            },
            source_id: self.id,
            content: self.content,
            embedding,
            metadata: self.metadata,
            platform_tags: self.platforms,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    documents: Vec<SeedDocument>,
}

pub fn load_corpus(path: &Path) -> Result<Vec<SeedDocument>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    parse_corpus(&content).with_context(|| format!("Invalid corpus file: {}", path.display()))
}

pub fn parse_corpus(content: &str) -> Result<Vec<SeedDocument>> {
    let file: CorpusFile = serde_json::from_str(content)?;

    for doc in &file.documents {
        if doc.id.trim().is_empty() {
            bail!("{} document with an empty id", doc.category.as_str());
        }
        if doc.category == Category::Component {
            bail!(
                "document '{}': components come from extraction, not the corpus",
                doc.id
            );
        }
        if doc.category == Category::Fingerprint {
            let draft = doc.clone().into_record(Vec::new());
            PlatformFingerprint::from_record(&draft).map_err(|e| anyhow::anyhow!(e))?;
        }
    }

    Ok(file.documents)
}

/// One `platform_identity` document per design-space platform that the
/// corpus does not already describe.
pub fn platform_identity_documents(space: &DesignSpace, existing: &[SeedDocument]) -> Vec<SeedDocument> {
    space
        .platforms
        .iter()
        .filter(|p| {
            !existing
                .iter()
                .any(|d| d.category == Category::PlatformIdentity && d.id == p.id)
        })
        .map(|p| {
            let mut content = p.describe_projection("the interface");
            if !p.primary_tokens.is_empty() {
                content.push_str(&format!(" Primary tokens: {}.", p.primary_tokens.join(", ")));
            }
            if !p.keywords.is_empty() {
                content.push_str(&format!(" Keywords: {}.", p.keywords.join(", ")));
            }
            SeedDocument {
                category: Category::PlatformIdentity,
                id: p.id.clone(),
                title: p.display_name().to_string(),
                content,
                platforms: vec![p.id.clone()],
                metadata: serde_json::json!({
                    "canonicalPosition": p.canonical_position,
                }),
            }
        })
        .collect()
}
