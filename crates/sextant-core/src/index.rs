//! Flat, upsert-keyed semantic index.
//!
//! Records are kept in insertion order and addressed by
//! `category:sourceId`. Upserting an existing key replaces the record in
//! place, so insertion order (and therefore tie-breaking) is stable.
//!
//! Search is a brute-force cosine scan over every record that passes the
//! filter. There is no approximate index: this is meant for low thousands
//! of records.

use serde::Serialize;
use std::collections::HashMap;

use crate::embedding::cosine_similarity;
use crate::models::{record_key, Category, SemanticIndexRecord};

/// Pre-filter applied before scoring.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter<'a> {
    pub category: Option<Category>,
    pub platform_tag: Option<&'a str>,
}

impl RecordFilter<'_> {
    fn accepts(&self, record: &SemanticIndexRecord) -> bool {
        if let Some(cat) = self.category {
            if record.category != cat {
                return false;
            }
        }
        if let Some(tag) = self.platform_tag {
            if !record.platform_tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }
}

/// A record and its similarity to the query vector.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord<'a> {
    pub record: &'a SemanticIndexRecord,
    pub similarity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SemanticIndex {
    records: Vec<SemanticIndexRecord>,
    positions: HashMap<String, usize>,
}

impl SemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = SemanticIndexRecord>) -> Self {
        let mut index = Self::new();
        for r in records {
            index.upsert(r);
        }
        index
    }

    /// Insert `record`, replacing any record with the same key.
    /// Returns `true` when an existing record was replaced.
    pub fn upsert(&mut self, record: SemanticIndexRecord) -> bool {
        let key = record.key();
        match self.positions.get(&key) {
            Some(&pos) => {
                self.records[pos] = record;
                true
            }
            None => {
                self.positions.insert(key, self.records.len());
                self.records.push(record);
                false
            }
        }
    }

    pub fn get(&self, category: Category, source_id: &str) -> Option<&SemanticIndexRecord> {
        self.positions
            .get(&record_key(category, source_id))
            .map(|&pos| &self.records[pos])
    }

    pub fn records(&self) -> &[SemanticIndexRecord] {
        &self.records
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &SemanticIndexRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<SemanticIndexRecord> {
        self.records
    }

    /// Cosine search: records passing `filter` whose similarity is at least
    /// `threshold`, best first, at most `limit`. Equal scores keep insertion
    /// order. Records whose vector length differs from `query` (empty, or
    /// from another model) are not candidates.
    pub fn search(
        &self,
        query: &[f32],
        filter: &RecordFilter<'_>,
        limit: usize,
        threshold: f64,
    ) -> Vec<ScoredRecord<'_>> {
        let mut hits: Vec<ScoredRecord<'_>> = self
            .records
            .iter()
            .filter(|r| filter.accepts(r))
            .filter(|r| !query.is_empty() && r.embedding.len() == query.len())
            .map(|r| ScoredRecord {
                record: r,
                similarity: cosine_similarity(query, &r.embedding) as f64,
            })
            .filter(|s| s.similarity >= threshold)
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        hits
    }
}
