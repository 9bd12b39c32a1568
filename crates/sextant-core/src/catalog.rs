//! The loaded, read-only bundle every engine queries.
//!
//! A [`Catalog`] is built once (by the application's loader or directly in
//! tests) and passed by reference into [`Navigator`](crate::navigator::Navigator)
//! and [`Validator`](crate::validation::Validator). Several independently
//! configured catalogs can coexist in one process; nothing here is global.

use crate::design_space::DesignSpace;
use crate::error::{NavigatorError, Result};
use crate::graph::ComponentGraph;
use crate::index::SemanticIndex;
use crate::models::{Category, ComponentRecord, EmbeddedComponent, PlatformFingerprint, SemanticIndexRecord};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    index: SemanticIndex,
    components: Vec<EmbeddedComponent>,
    design_space: DesignSpace,
    graph: ComponentGraph,
    fingerprints: Vec<PlatformFingerprint>,
}

impl Catalog {
    /// Assemble a catalog. Fingerprint records of the index are validated
    /// here; invalid ones are dropped with a warning.
    pub fn new(
        index: SemanticIndex,
        components: Vec<EmbeddedComponent>,
        design_space: DesignSpace,
        graph: ComponentGraph,
    ) -> Self {
        let fingerprints = index
            .by_category(Category::Fingerprint)
            .filter_map(|r| match PlatformFingerprint::from_record(r) {
                Ok(fp) => Some(fp),
                Err(e) => {
                    tracing::warn!("skipping fingerprint: {}", e);
                    None
                }
            })
            .collect();
        Self {
            index,
            components,
            design_space,
            graph,
            fingerprints,
        }
    }

    pub fn index(&self) -> &SemanticIndex {
        &self.index
    }

    pub fn design_space(&self) -> &DesignSpace {
        &self.design_space
    }

    pub fn graph(&self) -> &ComponentGraph {
        &self.graph
    }

    pub fn fingerprints(&self) -> &[PlatformFingerprint] {
        &self.fingerprints
    }

    pub fn fingerprint(&self, platform: &str) -> Option<&PlatformFingerprint> {
        self.fingerprints.iter().find(|f| f.platform == platform)
    }

    pub fn anchors(&self) -> impl Iterator<Item = &SemanticIndexRecord> {
        self.index.by_category(Category::Anchor)
    }

    pub fn embedded_components(&self) -> &[EmbeddedComponent] {
        &self.components
    }

    /// Components, optionally restricted to one platform.
    pub fn components(&self, platform: Option<&str>) -> Vec<&ComponentRecord> {
        self.components
            .iter()
            .map(|c| &c.record)
            .filter(|r| platform.is_none_or(|p| r.platform == p))
            .collect()
    }

    /// Look up a component by exact id.
    pub fn component(&self, id: &str) -> Option<&EmbeddedComponent> {
        self.components.iter().find(|c| c.record.id == id)
    }

    /// Resolve by exact id, then exact display name, then case-insensitive
    /// display name.
    pub fn resolve_component(&self, id_or_name: &str) -> Result<&EmbeddedComponent> {
        self.component(id_or_name)
            .or_else(|| self.components.iter().find(|c| c.record.name == id_or_name))
            .or_else(|| {
                self.components
                    .iter()
                    .find(|c| c.record.name.eq_ignore_ascii_case(id_or_name))
            })
            .ok_or_else(|| NavigatorError::component_not_found(id_or_name))
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.components.is_empty()
    }
}
