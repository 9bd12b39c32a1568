//! Validation engine: anchor activation, platform detection, drift, and
//! the composed full validation.
//!
//! Each public operation embeds the request once (through [`Lookup`]) and
//! reports the [`ScoringMode`] it ran in. Drift is
//!
//! ```text
//! drift = 1 − similarity(request, platform fingerprint)
//! ```
//!
//! bucketed into a [`DriftStatus`]. A platform without a fingerprint gets
//! the neutral drift `0.5`, and so does one whose stored vector cannot be
//! compared with the request's (see [`Lookup::comparable`]).

use serde::Serialize;

use crate::catalog::Catalog;
use crate::embedding::{round3, EmbeddingProvider, Lookup, ScoringMode};
use crate::error::Result;
use crate::index::RecordFilter;
use crate::models::{Category, SemanticIndexRecord, SHARED_PLATFORM};

/// Drift reported when no fingerprint exists for the platform.
pub const NEUTRAL_DRIFT: f64 = 0.5;

const TOP_ANCHORS: usize = 3;
const MAX_SUGGESTED_COMPONENTS: usize = 5;

/// Substrings that fail a request outright.
const ANTIPATTERNS: &[&str] = &[
    "comic sans",
    "lorem ipsum",
    "rainbow",
    "skeuomorph",
    "stock photo",
    "clip art",
    "clipart",
    "!important",
    "marquee",
    "blink",
];

/// Anchor id → visual patterns that express it.
const ANCHOR_PATTERNS: &[(&str, &[&str])] = &[
    ("precision", &["corner-brackets", "grid-snap"]),
    ("vigilance", &["scanlines", "threat-gradient"]),
    ("calm", &["breathing", "glass-blur"]),
    ("warmth", &["breathing"]),
    ("depth", &["glass-blur", "particles"]),
    ("motion", &["particles", "breathing"]),
    ("clarity", &["grid-snap", "corner-brackets"]),
    ("urgency", &["threat-gradient", "scanlines"]),
];

pub fn patterns_for_anchor(anchor: &str) -> &'static [&'static str] {
    ANCHOR_PATTERNS
        .iter()
        .find(|(a, _)| a.eq_ignore_ascii_case(anchor))
        .map(|(_, p)| *p)
        .unwrap_or(&[])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    Approved,
    Expansion,
    EdgeCase,
    Violation,
}

impl DriftStatus {
    pub fn from_drift(drift: f64) -> Self {
        if drift < 0.2 {
            DriftStatus::Approved
        } else if drift < 0.4 {
            DriftStatus::Expansion
        } else if drift < 0.6 {
            DriftStatus::EdgeCase
        } else {
            DriftStatus::Violation
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DriftStatus::Approved => "approved",
            DriftStatus::Expansion => "expansion",
            DriftStatus::EdgeCase => "edge_case",
            DriftStatus::Violation => "violation",
        }
    }
}

/// `1 − similarity`, clamped to `[0, 1]` and rounded to three decimals.
pub fn drift_from_similarity(similarity: f64) -> f64 {
    round3((1.0 - similarity).clamp(0.0, 1.0))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorScore {
    pub anchor: String,
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorActivation {
    pub mode: ScoringMode,
    pub anchors: Vec<AnchorScore>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformScore {
    pub platform: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDetection {
    pub mode: ScoringMode,
    pub platform: Option<String>,
    pub score: f64,
    pub runner_up: Option<PlatformScore>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub mode: ScoringMode,
    pub platform: String,
    pub fingerprint_found: bool,
    pub similarity: Option<f64>,
    pub drift: f64,
    pub status: DriftStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub mode: ScoringMode,
    pub request: String,
    pub detection: PlatformDetection,
    /// `None` when no platform was given and none could be detected.
    pub drift: Option<DriftReport>,
    pub top_anchors: Vec<AnchorScore>,
    pub antipatterns: Vec<String>,
    pub suggested_patterns: Vec<String>,
    pub suggested_components: Vec<String>,
    pub passed: bool,
}

pub struct Validator<'a> {
    catalog: &'a Catalog,
    provider: &'a dyn EmbeddingProvider,
}

impl<'a> Validator<'a> {
    pub fn new(catalog: &'a Catalog, provider: &'a dyn EmbeddingProvider) -> Self {
        Self { catalog, provider }
    }

    /// Score every stored anchor against `request`, strongest first.
    pub async fn anchor_activation(&self, request: &str) -> Result<AnchorActivation> {
        let lookup = Lookup::new(self.provider, request).await?;
        Ok(AnchorActivation {
            mode: lookup.mode(),
            anchors: self.activate(&lookup),
        })
    }

    fn activate(&self, lookup: &Lookup) -> Vec<AnchorScore> {
        let score = |r: &SemanticIndexRecord, sim: f64| AnchorScore {
            anchor: r.source_id.clone(),
            title: r.title.clone(),
            score: round3(sim),
        };
        let mut anchors: Vec<AnchorScore> = match lookup.vector() {
            Some(vector) => {
                let filter = RecordFilter {
                    category: Some(Category::Anchor),
                    platform_tag: None,
                };
                self.catalog
                    .index()
                    .search(vector, &filter, usize::MAX, f64::MIN)
                    .into_iter()
                    .map(|hit| score(hit.record, hit.similarity))
                    .collect()
            }
            None => self
                .catalog
                .anchors()
                .filter_map(|r| {
                    lookup
                        .score(&r.embedding, || r.keyword_haystack())
                        .map(|sim| score(r, sim))
                })
                .collect(),
        };
        anchors.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        anchors
    }

    /// The fingerprint most similar to `request`, with the runner-up.
    pub async fn detect_platform(&self, request: &str) -> Result<PlatformDetection> {
        let lookup = Lookup::new(self.provider, request).await?;
        Ok(self.detect(&lookup))
    }

    fn detect(&self, lookup: &Lookup) -> PlatformDetection {
        let mut scores: Vec<PlatformScore> = self
            .catalog
            .fingerprints()
            .iter()
            .filter_map(|fp| {
                lookup
                    .score(&fp.identity_embedding, || fp.keyword_haystack())
                    .map(|sim| PlatformScore {
                        platform: fp.platform.clone(),
                        score: round3(sim),
                    })
            })
            .collect();
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut ranked = scores.into_iter();
        let best = ranked.next();
        PlatformDetection {
            mode: lookup.mode(),
            score: best.as_ref().map(|b| b.score).unwrap_or(0.0),
            platform: best.map(|b| b.platform),
            runner_up: ranked.next(),
        }
    }

    /// Drift of `request` from `platform`'s stored identity.
    pub async fn drift(&self, request: &str, platform: &str) -> Result<DriftReport> {
        let lookup = Lookup::new(self.provider, request).await?;
        Ok(self.drift_with(&lookup, platform))
    }

    fn drift_with(&self, lookup: &Lookup, platform: &str) -> DriftReport {
        let fingerprint = self.catalog.fingerprint(platform);
        let similarity = fingerprint.and_then(|fp| {
            lookup
                .score(&fp.identity_embedding, || fp.keyword_haystack())
                .map(round3)
        });
        let drift = match similarity {
            Some(sim) => drift_from_similarity(sim),
            None if fingerprint.is_some() => {
                tracing::warn!(
                    "fingerprint for platform '{}' was embedded in another vector space; using neutral drift",
                    platform
                );
                NEUTRAL_DRIFT
            }
            None => {
                tracing::debug!("no fingerprint for platform '{}', using neutral drift", platform);
                NEUTRAL_DRIFT
            }
        };
        DriftReport {
            mode: lookup.mode(),
            platform: platform.to_string(),
            fingerprint_found: similarity.is_some(),
            similarity,
            drift,
            status: DriftStatus::from_drift(drift),
        }
    }

    /// Detection, activation and drift composed with an antipattern scan.
    ///
    /// Suggested patterns come from the top three activated anchors;
    /// suggested components are those (on the evaluated platform or shared)
    /// already using one of them. A report passes when no antipattern was
    /// found and drift is not a violation.
    pub async fn validate(&self, request: &str, platform: Option<&str>) -> Result<ValidationReport> {
        let lookup = Lookup::new(self.provider, request).await?;

        let detection = self.detect(&lookup);
        let target = platform
            .map(str::to_string)
            .or_else(|| detection.platform.clone());
        let drift = target.as_deref().map(|p| self.drift_with(&lookup, p));

        let top_anchors: Vec<AnchorScore> = self
            .activate(&lookup)
            .into_iter()
            .filter(|a| a.score > 0.0)
            .take(TOP_ANCHORS)
            .collect();

        let lowered = request.to_lowercase();
        let antipatterns: Vec<String> = ANTIPATTERNS
            .iter()
            .filter(|needle| lowered.contains(*needle))
            .map(|needle| needle.to_string())
            .collect();

        let mut suggested_patterns: Vec<String> = Vec::new();
        for anchor in &top_anchors {
            for pattern in patterns_for_anchor(&anchor.anchor) {
                if !suggested_patterns.iter().any(|p| p == pattern) {
                    suggested_patterns.push(pattern.to_string());
                }
            }
        }

        let suggested_components = self
            .catalog
            .components(None)
            .into_iter()
            .filter(|c| match target.as_deref() {
                Some(p) => c.platform == p || c.platform == SHARED_PLATFORM,
                None => true,
            })
            .filter(|c| c.patterns.iter().any(|p| suggested_patterns.contains(p)))
            .take(MAX_SUGGESTED_COMPONENTS)
            .map(|c| c.id.clone())
            .collect();

        let passed = antipatterns.is_empty()
            && drift
                .as_ref()
                .is_none_or(|d| d.status != DriftStatus::Violation);

        Ok(ValidationReport {
            mode: lookup.mode(),
            request: request.to_string(),
            detection,
            drift,
            top_anchors,
            antipatterns,
            suggested_patterns,
            suggested_components,
            passed,
        })
    }
}
