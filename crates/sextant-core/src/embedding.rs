//! Embedding provider trait, the keyword stub, and vector utilities.
//!
//! Every embedding-dependent operation goes through a single
//! [`EmbeddingProvider`] chosen once at startup. When no real provider is
//! configured the application injects [`KeywordProvider`], and the engines
//! fall back to keyword matching.
//!
//! That branch lives in one place, [`Lookup`]: a request text is turned
//! into a lookup once, and the lookup scores every target either by cosine
//! similarity (semantic mode) or by keyword hits (local mode). Callers
//! report [`Lookup::mode`] alongside their results; scores from the two
//! modes are on different scales and are never mixed.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::error::NavigatorError;

/// Why a text is being embedded. Both intents land in the same vector space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedIntent {
    /// Anything persisted into the index.
    Document,
    /// A live search string.
    Query,
}

/// How a response was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    Semantic,
    Local,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"voyage-3"`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality.
    fn dims(&self) -> usize;

    /// `false` only for the keyword stub.
    fn is_semantic(&self) -> bool {
        true
    }

    /// Embed a batch of texts, returning one vector per input, in order.
    async fn embed(&self, texts: &[String], intent: EmbedIntent) -> Result<Vec<Vec<f32>>>;
}

/// Keyword stub used when no embedding provider is configured.
///
/// It produces no vectors; its presence switches the engines to local
/// keyword scoring.
pub struct KeywordProvider;

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn model_name(&self) -> &str {
        "keyword"
    }

    fn dims(&self) -> usize {
        0
    }

    fn is_semantic(&self) -> bool {
        false
    }

    async fn embed(&self, _texts: &[String], _intent: EmbedIntent) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled")
    }
}

/// Embed a single query text.
pub async fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> Result<Vec<f32>> {
    let results = provider.embed(&[text.to_string()], EmbedIntent::Query).await?;
    results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors or vectors
/// of different lengths.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "like", "make", "want", "need",
    "some", "should", "would", "could", "our", "your", "has", "have", "are", "was", "its",
];

/// Distinct lower-cased terms of at least three characters, stopwords removed.
pub fn keyword_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in text
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
    {
        let term = raw.trim_matches(|c: char| c == '-' || c == '_');
        if term.chars().count() < 3 || STOPWORDS.contains(&term) {
            continue;
        }
        if !terms.iter().any(|t| t == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

/// Local-mode score: `min(hits / 3, 1)`, where hits counts distinct terms
/// found in the (already lower-cased) haystack.
pub fn keyword_score(terms: &[String], haystack: &str) -> f64 {
    let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
    (hits as f64 / 3.0).min(1.0)
}

/// A request text prepared for scoring against stored targets.
#[derive(Debug, Clone)]
pub enum Lookup {
    Semantic(Vec<f32>),
    Keywords(Vec<String>),
}

impl Lookup {
    /// Embed `text` with query intent, or tokenize it when the provider is
    /// the keyword stub. A configured provider's failure is returned as
    /// [`NavigatorError::Provider`]; it never degrades to keywords.
    pub async fn new(provider: &dyn EmbeddingProvider, text: &str) -> Result<Self, NavigatorError> {
        if !provider.is_semantic() {
            return Ok(Lookup::Keywords(keyword_terms(text)));
        }
        let vector = embed_query(provider, text)
            .await
            .map_err(NavigatorError::Provider)?;
        Ok(Lookup::Semantic(vector))
    }

    pub fn mode(&self) -> ScoringMode {
        match self {
            Lookup::Semantic(_) => ScoringMode::Semantic,
            Lookup::Keywords(_) => ScoringMode::Local,
        }
    }

    pub fn vector(&self) -> Option<&[f32]> {
        match self {
            Lookup::Semantic(v) => Some(v),
            Lookup::Keywords(_) => None,
        }
    }

    /// `false` when a stored vector cannot be compared with this lookup: in
    /// semantic mode its length must equal the query vector's. Empty vectors
    /// (keyword-only ingest) and vectors from a model with different `dims`
    /// are incomparable.
    pub fn comparable(&self, embedding: &[f32]) -> bool {
        match self {
            Lookup::Semantic(v) => !v.is_empty() && v.len() == embedding.len(),
            Lookup::Keywords(_) => true,
        }
    }

    /// Score one target, or `None` when its stored vector is not
    /// [`comparable`](Lookup::comparable). `haystack` is only built in local
    /// mode.
    pub fn score(&self, embedding: &[f32], haystack: impl FnOnce() -> String) -> Option<f64> {
        match self {
            Lookup::Semantic(v) if self.comparable(embedding) => {
                Some(cosine_similarity(v, embedding) as f64)
            }
            Lookup::Semantic(_) => None,
            Lookup::Keywords(terms) => Some(keyword_score(terms, &haystack())),
        }
    }
}

/// Round to three decimals.
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
