//! Navigator engine: the five query modes over a [`Catalog`].
//!
//! | Mode | Provider call | Scoring |
//! |------|---------------|---------|
//! | [`match_reference`](Navigator::match_reference) | query embedding | cosine or keyword hits |
//! | [`project`](Navigator::project) | query embedding | cosine or keyword hits, then per platform |
//! | [`search_by_position`](Navigator::search_by_position) | none | `1 − distance / 4` |
//! | [`interpolate`](Navigator::interpolate) | none | linear blend of two components |
//! | [`explore`](Navigator::explore) | none | nearest platform + pole suggestions |
//!
//! Responses of the embedding-dependent modes carry the [`ScoringMode`]
//! they were computed in.

use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::design_space::position_similarity;
use crate::embedding::{cosine_similarity, round3, EmbeddingProvider, Lookup, ScoringMode};
use crate::error::{NavigatorError, Result};
use crate::models::{Axis, ComponentRecord, EmbeddedComponent, PartialPosition, SemanticPosition, SHARED_PLATFORM};

const MAX_MATCH_TOKENS: usize = 8;
const MAX_MATCH_PATTERNS: usize = 5;
const COMPONENTS_PER_PROJECTION: usize = 3;
/// Axis values beyond ±this count as leaning toward a pole.
pub const POLE_THRESHOLD: f64 = 0.3;
/// Upper bound on INTERPOLATE's interval count.
pub const MAX_INTERPOLATION_STEPS: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMatch {
    pub id: String,
    pub name: String,
    pub platform: String,
    pub file_path: String,
    pub similarity: f64,
    pub description: String,
    pub tokens: Vec<String>,
    pub patterns: Vec<String>,
    pub semantic_position: SemanticPosition,
}

impl ComponentMatch {
    fn new(record: &ComponentRecord, similarity: f64) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            platform: record.platform.clone(),
            file_path: record.file_path.clone(),
            similarity: round3(similarity),
            description: record.description.clone(),
            tokens: record.tokens.clone(),
            patterns: record.patterns.clone(),
            semantic_position: record.semantic_position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub mode: ScoringMode,
    pub query: String,
    pub platform: Option<String>,
    pub matches: Vec<ComponentMatch>,
    pub recommended_tokens: Vec<String>,
    pub recommended_patterns: Vec<String>,
    pub implementation_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub platform: String,
    pub platform_name: String,
    pub description: String,
    pub components: Vec<ComponentMatch>,
    pub tokens: Vec<String>,
    pub patterns: Vec<String>,
    pub position_adjustments: SemanticPosition,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResult {
    pub mode: ScoringMode,
    pub reference: String,
    pub base_match: Option<ComponentMatch>,
    pub projections: Vec<ProjectionResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMatch {
    pub id: String,
    pub name: String,
    pub platform: String,
    pub similarity: f64,
    pub semantic_position: SemanticPosition,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationStep {
    pub ratio: f64,
    pub position: SemanticPosition,
    pub tokens: Vec<String>,
    pub patterns: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolateResult {
    pub from: String,
    pub to: String,
    pub steps: Vec<InterpolationStep>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestPlatform {
    pub id: String,
    pub name: String,
    pub similarity: f64,
    pub canonical_position: SemanticPosition,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreResult {
    pub position: SemanticPosition,
    pub nearest_platform: Option<NearestPlatform>,
    pub nearby_components: Vec<PositionMatch>,
    pub suggested_tokens: Vec<String>,
    pub suggested_patterns: Vec<String>,
}

/// Query engine borrowing a catalog and the process-wide provider.
pub struct Navigator<'a> {
    catalog: &'a Catalog,
    provider: &'a dyn EmbeddingProvider,
}

impl<'a> Navigator<'a> {
    pub fn new(catalog: &'a Catalog, provider: &'a dyn EmbeddingProvider) -> Self {
        Self { catalog, provider }
    }

    /// MATCH: components similar to a free-text reference.
    ///
    /// Candidates are restricted to `platform` plus shared components when
    /// a platform is given. Nothing clearing `threshold` yields an empty
    /// result, not an error.
    pub async fn match_reference(
        &self,
        query: &str,
        platform: Option<&str>,
        limit: usize,
        threshold: f64,
    ) -> Result<MatchResult> {
        let lookup = Lookup::new(self.provider, query).await?;
        let scored = self.score_components(&lookup, platform, limit, threshold);

        let matches: Vec<ComponentMatch> = scored
            .iter()
            .map(|(c, sim)| ComponentMatch::new(&c.record, *sim))
            .collect();
        let recommended_tokens = weighted_top(
            scored.iter().map(|(c, sim)| (&c.record.tokens, *sim)),
            MAX_MATCH_TOKENS,
        );
        let recommended_patterns = weighted_top(
            scored.iter().map(|(c, sim)| (&c.record.patterns, *sim)),
            MAX_MATCH_PATTERNS,
        );
        let implementation_path = scored
            .first()
            .map(|(best, _)| implementation_path(&best.record, &recommended_tokens, &recommended_patterns));

        Ok(MatchResult {
            mode: lookup.mode(),
            query: query.to_string(),
            platform: platform.map(str::to_string),
            matches,
            recommended_tokens,
            recommended_patterns,
            implementation_path,
        })
    }

    fn score_components(
        &self,
        lookup: &Lookup,
        platform: Option<&str>,
        limit: usize,
        threshold: f64,
    ) -> Vec<(&'a EmbeddedComponent, f64)> {
        let mut scored: Vec<(&EmbeddedComponent, f64)> = self
            .catalog
            .embedded_components()
            .iter()
            .filter(|c| match platform {
                Some(p) => c.record.platform == p || c.record.platform == SHARED_PLATFORM,
                None => true,
            })
            .filter_map(|c| {
                lookup
                    .score(&c.embedding, || c.record.keyword_haystack())
                    .map(|sim| (c, sim))
            })
            .filter(|(_, sim)| *sim >= threshold)
            .collect();
        sort_desc(&mut scored, |(_, s)| *s);
        scored.truncate(limit);
        scored
    }

    /// PROJECT: express one reference in several platforms.
    ///
    /// The top unfiltered match is the anchor; each platform's own
    /// components are ranked against it (by embedding in semantic mode, by
    /// semantic position in local mode). Unknown platform ids are skipped;
    /// `None` means every platform of the design space, in definition order.
    pub async fn project(
        &self,
        reference: &str,
        platforms: Option<&[String]>,
        threshold: f64,
    ) -> Result<ProjectResult> {
        let lookup = Lookup::new(self.provider, reference).await?;
        let base = self
            .score_components(&lookup, None, 1, threshold)
            .into_iter()
            .next();

        let space = self.catalog.design_space();
        let targets: Vec<&str> = match platforms {
            Some(ids) => ids.iter().map(String::as_str).collect(),
            None => space.platforms.iter().map(|p| p.id.as_str()).collect(),
        };

        let mut projections = Vec::new();
        for id in targets {
            let Some(def) = space.platform(id) else {
                tracing::debug!("project: skipping unknown platform '{}'", id);
                continue;
            };

            let mut ranked: Vec<(&EmbeddedComponent, f64)> = self
                .catalog
                .embedded_components()
                .iter()
                .filter(|c| c.record.platform == def.id)
                .filter_map(|c| {
                    let sim = match (base, &lookup) {
                        (Some((top, _)), Lookup::Semantic(_)) => lookup
                            .comparable(&c.embedding)
                            .then(|| cosine_similarity(&top.embedding, &c.embedding) as f64),
                        (Some((top, _)), Lookup::Keywords(_)) => Some(position_similarity(
                            &top.record.semantic_position,
                            &c.record.semantic_position,
                        )),
                        (None, _) => lookup.score(&c.embedding, || c.record.keyword_haystack()),
                    };
                    sim.map(|s| (c, s))
                })
                .collect();
            sort_desc(&mut ranked, |(_, s)| *s);
            ranked.truncate(COMPONENTS_PER_PROJECTION);

            let mut tokens = Vec::new();
            push_unique(&mut tokens, &def.primary_tokens);
            let mut patterns = Vec::new();
            for (c, _) in &ranked {
                push_unique(&mut tokens, &c.record.tokens);
                push_unique(&mut patterns, &c.record.patterns);
            }

            projections.push(ProjectionResult {
                platform: def.id.clone(),
                platform_name: def.display_name().to_string(),
                description: def.describe_projection(reference),
                components: ranked
                    .iter()
                    .map(|(c, s)| ComponentMatch::new(&c.record, *s))
                    .collect(),
                tokens,
                patterns,
                position_adjustments: def.canonical_position,
            });
        }

        Ok(ProjectResult {
            mode: lookup.mode(),
            reference: reference.to_string(),
            base_match: base.map(|(c, s)| ComponentMatch::new(&c.record, s)),
            projections,
        })
    }

    /// SEARCH-BY-POSITION: components nearest a point of the design space.
    /// Pure geometry; equal similarities keep catalog order.
    pub fn search_by_position(&self, target: &PartialPosition, limit: usize) -> Vec<PositionMatch> {
        let target = target.resolve();
        let mut scored: Vec<(&ComponentRecord, f64)> = self
            .catalog
            .components(None)
            .into_iter()
            .map(|r| (r, position_similarity(&target, &r.semantic_position)))
            .collect();
        sort_desc(&mut scored, |(_, s)| *s);
        scored
            .into_iter()
            .take(limit)
            .map(|(r, sim)| PositionMatch {
                id: r.id.clone(),
                name: r.name.clone(),
                platform: r.platform.clone(),
                similarity: round3(sim),
                semantic_position: r.semantic_position,
            })
            .collect()
    }

    /// INTERPOLATE: `steps + 1` blends from component `a` (ratio 0) to `b`
    /// (ratio 1).
    ///
    /// Shared tokens and patterns are always kept. Below the midpoint a
    /// shrinking share of A's exclusive tokens is kept along with all of A's
    /// exclusive patterns; above it, a growing share of B's. Exactly at 0.5
    /// neither side's exclusives are included.
    pub fn interpolate(&self, a: &str, b: &str, steps: usize) -> Result<InterpolateResult> {
        if steps == 0 {
            return Err(NavigatorError::InvalidArgument(
                "interpolation needs at least one step".to_string(),
            ));
        }
        if steps > MAX_INTERPOLATION_STEPS {
            return Err(NavigatorError::InvalidArgument(format!(
                "interpolation steps must be at most {}, got {}",
                MAX_INTERPOLATION_STEPS, steps
            )));
        }
        let a = &self.catalog.resolve_component(a)?.record;
        let b = &self.catalog.resolve_component(b)?.record;

        let tokens = Blend::new(&a.tokens, &b.tokens);
        let patterns = Blend::new(&a.patterns, &b.patterns);

        let steps = (0..=steps)
            .map(|i| {
                let ratio = i as f64 / steps as f64;
                let position = a.semantic_position.lerp(&b.semantic_position, ratio);
                InterpolationStep {
                    ratio,
                    position,
                    tokens: tokens.proportional(ratio),
                    patterns: patterns.whole_side(ratio),
                    description: self.describe_blend(&a.name, &b.name, ratio, &position),
                }
            })
            .collect();

        Ok(InterpolateResult {
            from: a.id.clone(),
            to: b.id.clone(),
            steps,
        })
    }

    fn describe_blend(&self, a: &str, b: &str, ratio: f64, position: &SemanticPosition) -> String {
        let mut text = if ratio <= 0.0 {
            format!("Pure {}", a)
        } else if ratio >= 1.0 {
            format!("Pure {}", b)
        } else if ratio < 0.3 {
            format!("Mostly {} with hints of {}", a, b)
        } else if ratio > 0.7 {
            format!("Mostly {} with hints of {}", b, a)
        } else {
            format!("Balanced blend of {} and {}", a, b)
        };

        let space = self.catalog.design_space();
        let leanings: Vec<String> = [Axis::TerminalOrganic, Axis::CoolWarm]
            .into_iter()
            .filter_map(|axis| {
                let v = position.get(axis);
                if v > POLE_THRESHOLD {
                    Some(space.pole_label(axis, true))
                } else if v < -POLE_THRESHOLD {
                    Some(space.pole_label(axis, false))
                } else {
                    None
                }
            })
            .collect();
        if !leanings.is_empty() {
            text.push_str(", leaning ");
            text.push_str(&leanings.join(" and "));
        }
        text.push('.');
        text
    }

    /// EXPLORE: where a slider position sits in the design space.
    pub fn explore(&self, partial: &PartialPosition, limit: usize) -> ExploreResult {
        let position = partial.resolve().clamped();
        let space = self.catalog.design_space();

        let mut suggested_tokens = Vec::new();
        let mut suggested_patterns = Vec::new();

        let nearest_platform = space.nearest_platform(&position).map(|(p, sim)| {
            push_unique(&mut suggested_tokens, &p.primary_tokens);
            NearestPlatform {
                id: p.id.clone(),
                name: p.display_name().to_string(),
                similarity: round3(sim),
                canonical_position: p.canonical_position,
            }
        });

        for axis in Axis::ALL {
            let v = position.get(axis);
            let Some(def) = space.axis(axis) else { continue };
            let pole = if v > POLE_THRESHOLD {
                &def.positive
            } else if v < -POLE_THRESHOLD {
                &def.negative
            } else {
                continue;
            };
            push_unique(&mut suggested_tokens, &pole.tokens);
            push_unique(&mut suggested_patterns, &pole.patterns);
        }

        let exact = PartialPosition {
            terminal_organic: Some(position.terminal_organic),
            minimal_dense: Some(position.minimal_dense),
            cool_warm: Some(position.cool_warm),
            static_animated: Some(position.static_animated),
        };

        ExploreResult {
            position,
            nearest_platform,
            nearby_components: self.search_by_position(&exact, limit),
            suggested_tokens,
            suggested_patterns,
        }
    }
}

/// Stable descending sort; equal keys keep their input order.
fn sort_desc<T>(items: &mut [T], key: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn push_unique(out: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
}

/// Rank strings by summed weight across lists; ties keep first-seen order.
fn weighted_top<'r>(lists: impl Iterator<Item = (&'r Vec<String>, f64)>, n: usize) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut weights: HashMap<&str, f64> = HashMap::new();
    for (list, weight) in lists {
        for item in list {
            let entry = weights.entry(item.as_str()).or_insert_with(|| {
                order.push(item.as_str());
                0.0
            });
            *entry += weight;
        }
    }
    let mut ranked: Vec<(&str, f64)> = order.into_iter().map(|k| (k, weights[k])).collect();
    sort_desc(&mut ranked, |(_, w)| *w);
    ranked.into_iter().take(n).map(|(k, _)| k.to_string()).collect()
}

fn implementation_path(best: &ComponentRecord, tokens: &[String], patterns: &[String]) -> String {
    let mut text = format!("Start from {} ({})", best.name, best.platform);
    if !best.file_path.is_empty() {
        text.push_str(&format!(" at {}/{}", best.origin_repo, best.file_path));
    }
    text.push('.');
    if !tokens.is_empty() {
        text.push_str(&format!(" Reuse tokens {}.", tokens.join(", ")));
    }
    if !patterns.is_empty() {
        text.push_str(&format!(" Apply patterns {}.", patterns.join(", ")));
    }
    if !best.related_components.is_empty() {
        text.push_str(&format!(
            " Check related components {}.",
            best.related_components.join(", ")
        ));
    }
    text
}

/// Token or pattern lists of two components split into shared and
/// exclusive parts, each in first-seen order.
struct Blend {
    shared: Vec<String>,
    only_a: Vec<String>,
    only_b: Vec<String>,
}

impl Blend {
    fn new(a: &[String], b: &[String]) -> Self {
        let mut a_unique = Vec::new();
        push_unique(&mut a_unique, a);
        let mut b_unique = Vec::new();
        push_unique(&mut b_unique, b);

        let (shared, only_a): (Vec<String>, Vec<String>) = a_unique.into_iter().partition(|t| b.contains(t));
        let only_b = b_unique.into_iter().filter(|t| !a.contains(t)).collect();
        Self {
            shared,
            only_a,
            only_b,
        }
    }

    /// Shared items plus `ceil(len × |1 − 2·ratio|)` exclusives of the
    /// nearer side.
    fn proportional(&self, ratio: f64) -> Vec<String> {
        let mut out = self.shared.clone();
        if ratio < 0.5 {
            let n = (self.only_a.len() as f64 * (1.0 - 2.0 * ratio)).ceil() as usize;
            out.extend(self.only_a.iter().take(n).cloned());
        } else if ratio > 0.5 {
            let n = (self.only_b.len() as f64 * (2.0 * ratio - 1.0)).ceil() as usize;
            out.extend(self.only_b.iter().take(n).cloned());
        }
        out
    }

    /// Shared items plus every exclusive of the nearer side.
    fn whole_side(&self, ratio: f64) -> Vec<String> {
        let mut out = self.shared.clone();
        if ratio < 0.5 {
            out.extend(self.only_a.iter().cloned());
        } else if ratio > 0.5 {
            out.extend(self.only_b.iter().cloned());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design_space::{DesignSpace, DesignSpaceAxis, PlatformDefinition, Pole};
    use crate::embedding::testing::{hash_embed, FailingProvider, HashProvider};
    use crate::embedding::KeywordProvider;
    use crate::graph::ComponentGraph;
    use crate::index::SemanticIndex;
    use std::collections::BTreeSet;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn component(name: &str, platform: &str, description: &str, pos: SemanticPosition) -> EmbeddedComponent {
        let record = ComponentRecord {
            id: format!("lib:{}", name),
            name: name.to_string(),
            origin_repo: "lib".to_string(),
            platform: platform.to_string(),
            file_path: format!("src/{}.tsx", name),
            description: description.to_string(),
            visual_characteristics: String::new(),
            implementation_notes: String::new(),
            imports: vec![],
            tokens: vec![],
            patterns: vec![],
            anchors: vec![],
            rules: vec![],
            related_components: vec![],
            semantic_position: pos,
            embedding_text: description.to_string(),
            file_type: "tsx".to_string(),
            line_count: 40,
            last_modified: chrono::Utc::now(),
        };
        EmbeddedComponent {
            embedding: hash_embed(description),
            record,
        }
    }

    fn pole(label: &str) -> Pole {
        Pole {
            label: label.to_string(),
            tokens: vec![format!("--{}", label)],
            patterns: vec![format!("{}-pattern", label)],
        }
    }

    fn space() -> DesignSpace {
        DesignSpace {
            axes: Axis::ALL
                .iter()
                .map(|&a| {
                    let (neg, pos) = a.poles();
                    DesignSpaceAxis {
                        id: a,
                        name: a.id().to_string(),
                        negative: pole(neg),
                        positive: pole(pos),
                    }
                })
                .collect(),
            platforms: vec![
                PlatformDefinition {
                    id: "astrolabe".to_string(),
                    name: "Astrolabe".to_string(),
                    canonical_position: SemanticPosition::new(0.0, 0.0, 0.6, 0.0),
                    primary_tokens: strings(&["--brass"]),
                    keywords: vec![],
                    expression: String::new(),
                },
                PlatformDefinition {
                    id: "sentinel".to_string(),
                    name: "Sentinel".to_string(),
                    canonical_position: SemanticPosition::new(-0.8, 0.4, -0.6, 0.0),
                    primary_tokens: strings(&["--phosphor"]),
                    keywords: vec![],
                    expression: "{reference}, hardened for {platform}".to_string(),
                },
            ],
        }
    }

    fn catalog() -> Catalog {
        let mut dial = component(
            "BrassDial",
            "astrolabe",
            "warm brass dial with engraved gauge",
            SemanticPosition::new(0.5, 0.0, 0.7, 0.2),
        );
        dial.record.tokens = strings(&["--brass", "--ember"]);
        dial.record.patterns = strings(&["breathing"]);

        let mut chart = component(
            "StarChart",
            "astrolabe",
            "celestial chart with glowing stars",
            SemanticPosition::new(0.3, 0.5, 0.4, 0.6),
        );
        chart.record.tokens = strings(&["--brass", "--night"]);
        chart.record.patterns = strings(&["particles"]);

        let mut grid = component(
            "ThreatGrid",
            "sentinel",
            "scanline threat grid with cold alerts",
            SemanticPosition::new(-0.9, 0.6, -0.6, 0.0),
        );
        grid.record.tokens = strings(&["--phosphor", "--alert"]);
        grid.record.patterns = strings(&["scanlines", "grid-snap"]);

        let mut button = component(
            "Button",
            SHARED_PLATFORM,
            "plain button with gauge label",
            SemanticPosition::default(),
        );
        button.record.tokens = strings(&["--space-2"]);

        Catalog::new(
            SemanticIndex::new(),
            vec![dial, chart, grid, button],
            space(),
            ComponentGraph::default(),
        )
    }

    #[tokio::test]
    async fn test_match_restricts_to_platform_plus_shared() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &HashProvider);
        let result = nav
            .match_reference("gauge", Some("astrolabe"), 10, 0.01)
            .await
            .unwrap();
        assert_eq!(result.mode, ScoringMode::Semantic);
        assert!(!result.matches.is_empty());
        assert!(result
            .matches
            .iter()
            .all(|m| m.platform == "astrolabe" || m.platform == SHARED_PLATFORM));
        assert!(result.implementation_path.is_some());
    }

    #[tokio::test]
    async fn test_match_above_one_threshold_is_empty() {
        let catalog = catalog();
        for provider in [&HashProvider as &dyn EmbeddingProvider, &KeywordProvider] {
            let nav = Navigator::new(&catalog, provider);
            let result = nav
                .match_reference("warm brass dial with engraved gauge", None, 10, 1.01)
                .await
                .unwrap();
            assert!(result.matches.is_empty());
            assert!(result.recommended_tokens.is_empty());
            assert!(result.implementation_path.is_none());
        }
    }

    #[tokio::test]
    async fn test_match_local_mode_aggregates_tokens() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let result = nav
            .match_reference("brass gauge dial", None, 5, 0.3)
            .await
            .unwrap();
        assert_eq!(result.mode, ScoringMode::Local);
        assert_eq!(result.matches[0].id, "lib:BrassDial");
        assert_eq!(result.matches[0].similarity, 1.0);
        assert_eq!(result.recommended_tokens[0], "--brass");
        assert!(result.recommended_tokens.len() <= 8);
        assert!(result.recommended_patterns.len() <= 5);
    }

    #[tokio::test]
    async fn test_match_skips_components_without_comparable_vectors() {
        let mut catalog_components = catalog().embedded_components().to_vec();
        catalog_components[0].embedding.clear();
        catalog_components[1].embedding = vec![1.0; 4];
        let catalog = Catalog::new(
            SemanticIndex::new(),
            catalog_components,
            space(),
            ComponentGraph::default(),
        );
        let nav = Navigator::new(&catalog, &HashProvider);

        let result = nav
            .match_reference("warm brass dial with engraved gauge", None, 10, f64::MIN)
            .await
            .unwrap();
        let ids: Vec<&str> = result.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&"lib:BrassDial"));
        assert!(!ids.contains(&"lib:StarChart"));

        let projected = nav
            .project("warm brass dial", None, f64::MIN)
            .await
            .unwrap();
        assert!(projected.projections[0].components.is_empty());
    }

    #[tokio::test]
    async fn test_match_surfaces_provider_error() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &FailingProvider);
        let err = nav.match_reference("gauge", None, 5, 0.3).await.unwrap_err();
        assert!(matches!(err, NavigatorError::Provider(_)));
    }

    #[tokio::test]
    async fn test_project_returns_requested_platforms_in_order() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &HashProvider);
        let platforms = strings(&["sentinel", "nowhere", "astrolabe"]);
        let result = nav
            .project("warm brass dial", Some(&platforms), 0.0)
            .await
            .unwrap();

        let ids: Vec<&str> = result.projections.iter().map(|p| p.platform.as_str()).collect();
        assert_eq!(ids, vec!["sentinel", "astrolabe"]);
        assert_eq!(
            result.projections[0].position_adjustments,
            SemanticPosition::new(-0.8, 0.4, -0.6, 0.0)
        );
        assert_eq!(
            result.projections[1].position_adjustments,
            SemanticPosition::new(0.0, 0.0, 0.6, 0.0)
        );
        assert_eq!(result.projections[0].tokens[0], "--phosphor");
        assert_eq!(result.projections[0].description, "warm brass dial, hardened for Sentinel");
        assert!(result.projections[1].components.len() <= 3);
        assert!(result.projections[1]
            .components
            .iter()
            .all(|c| c.platform == "astrolabe"));
    }

    #[tokio::test]
    async fn test_project_defaults_to_every_platform_in_local_mode() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let result = nav.project("brass dial", None, 0.3).await.unwrap();
        assert_eq!(result.mode, ScoringMode::Local);
        assert_eq!(result.base_match.as_ref().unwrap().id, "lib:BrassDial");
        assert_eq!(result.projections.len(), 2);
        assert_eq!(result.projections[0].platform, "astrolabe");
        assert_eq!(result.projections[0].components[0].id, "lib:BrassDial");
    }

    #[test]
    fn test_search_by_position_is_stable() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let target = PartialPosition {
            terminal_organic: Some(-0.9),
            ..Default::default()
        };
        let first = nav.search_by_position(&target, 10);
        let second = nav.search_by_position(&target, 10);
        let ids = |r: &[PositionMatch]| r.iter().map(|m| m.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.len(), 4);
        assert!(first.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert_eq!(nav.search_by_position(&target, 2).len(), 2);
    }

    #[test]
    fn test_search_by_position_exact_hit() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let hits = nav.search_by_position(&PartialPosition::default(), 1);
        assert_eq!(hits[0].id, "lib:Button");
        assert_eq!(hits[0].similarity, 1.0);
    }

    #[test]
    fn test_interpolate_endpoints_match_components() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let result = nav.interpolate("BrassDial", "lib:ThreatGrid", 4).unwrap();
        assert_eq!(result.steps.len(), 5);

        let set = |v: &[String]| v.iter().cloned().collect::<BTreeSet<_>>();
        let first = &result.steps[0];
        let last = &result.steps[4];
        assert_eq!(first.ratio, 0.0);
        assert_eq!(set(&first.tokens), set(&strings(&["--brass", "--ember"])));
        assert_eq!(last.ratio, 1.0);
        assert_eq!(set(&last.tokens), set(&strings(&["--phosphor", "--alert"])));
        assert_eq!(first.position, SemanticPosition::new(0.5, 0.0, 0.7, 0.2));
        assert!(first.description.starts_with("Pure BrassDial"));
        assert!(last.description.starts_with("Pure ThreatGrid"));
    }

    #[test]
    fn test_interpolate_midpoint_favors_neither_side() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let result = nav.interpolate("BrassDial", "StarChart", 2).unwrap();
        let mid = &result.steps[1];
        assert_eq!(mid.ratio, 0.5);
        assert_eq!(mid.tokens, strings(&["--brass"]));
        assert!(mid.patterns.is_empty());
        assert!(mid.description.starts_with("Balanced blend of BrassDial and StarChart"));
        assert!(mid.description.contains("organic"));
        assert!(mid.description.contains("warm"));
    }

    #[test]
    fn test_interpolate_reports_unresolved_endpoint() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let err = nav.interpolate("BrassDial", "Ghost", 3).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Ghost"));
        assert!(matches!(
            nav.interpolate("BrassDial", "StarChart", 0),
            Err(NavigatorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_interpolate_step_count_is_bounded() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let result = nav
            .interpolate("BrassDial", "StarChart", MAX_INTERPOLATION_STEPS)
            .unwrap();
        assert_eq!(result.steps.len(), MAX_INTERPOLATION_STEPS + 1);
        let err = nav
            .interpolate("BrassDial", "StarChart", 1_000_000_000)
            .unwrap_err();
        assert!(matches!(err, NavigatorError::InvalidArgument(_)));
        assert!(err.to_string().contains("at most 100"));
    }

    #[test]
    fn test_blend_shrinks_exclusive_share() {
        let blend = Blend::new(&strings(&["s", "a1", "a2", "a3", "a4"]), &strings(&["s", "b1"]));
        assert_eq!(blend.proportional(0.0).len(), 5);
        assert_eq!(blend.proportional(0.25), strings(&["s", "a1", "a2"]));
        assert_eq!(blend.proportional(0.5), strings(&["s"]));
        assert_eq!(blend.proportional(0.75), strings(&["s", "b1"]));
        assert_eq!(blend.whole_side(0.4), strings(&["s", "a1", "a2", "a3", "a4"]));
        assert_eq!(blend.whole_side(0.6), strings(&["s", "b1"]));
    }

    #[test]
    fn test_explore_warm_position_finds_astrolabe() {
        let catalog = catalog();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let result = nav.explore(
            &PartialPosition {
                cool_warm: Some(0.5),
                ..Default::default()
            },
            3,
        );
        let nearest = result.nearest_platform.unwrap();
        assert_eq!(nearest.id, "astrolabe");
        assert!(result.suggested_tokens.contains(&"--brass".to_string()));
        assert!(result.suggested_tokens.contains(&"--warm".to_string()));
        for excluded in ["--cool", "--terminal", "--organic", "--minimal", "--dense", "--static", "--animated"] {
            assert!(!result.suggested_tokens.contains(&excluded.to_string()));
        }
        assert_eq!(result.suggested_patterns, strings(&["warm-pattern"]));
        assert_eq!(result.nearby_components.len(), 3);
    }

    #[test]
    fn test_explore_degraded_catalog_is_empty_not_error() {
        let catalog = Catalog::default();
        let nav = Navigator::new(&catalog, &KeywordProvider);
        let result = nav.explore(&PartialPosition::default(), 5);
        assert!(result.nearest_platform.is_none());
        assert!(result.nearby_components.is_empty());
        assert!(result.suggested_tokens.is_empty());
    }

    #[test]
    fn test_weighted_top_orders_by_total_weight() {
        let a = strings(&["x", "y"]);
        let b = strings(&["y", "z"]);
        let top = weighted_top(vec![(&a, 0.5), (&b, 0.4)].into_iter(), 2);
        assert_eq!(top, strings(&["y", "x"]));
    }
}
