//! Offline ingestion pipeline.
//!
//! ```text
//! design space ─┐
//! repos ── extract ── graph ──┐
//! corpus ─────────────────────┼── embed (batched) ── index ── write_snapshot
//! platform identities ────────┘
//! ```
//!
//! The run is all-or-nothing. Embedding happens before anything touches the
//! data directory, and [`store::write_snapshot`] swaps files in only after
//! they are all written, so an error at any step leaves the previous snapshot
//! untouched. A failed run is retried from scratch.
//!
//! With the keyword provider (embedding disabled) the run still writes every
//! record, with empty embeddings, and the engines serve in local mode.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use sextant_core::embedding::{EmbedIntent, EmbeddingProvider};
use sextant_core::graph::build_graph;
use sextant_core::index::SemanticIndex;
use sextant_core::models::{Category, ComponentRecord, EmbeddedComponent, SemanticIndexRecord};

use crate::config::Config;
use crate::corpus::{self, SeedDocument};
use crate::embedding;
use crate::extract;
use crate::store::{self, Manifest, Snapshot};

/// Counts reported by an ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub dry_run: bool,
    pub semantic: bool,
    pub components: usize,
    pub documents: usize,
    pub graph_edges: usize,
    pub batches: usize,
    pub categories: BTreeMap<String, usize>,
}

/// Embed `texts` in batches of `batch_size`, sleeping `delay` between
/// batches. The first failing batch aborts the whole call.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
    delay: Duration,
) -> Result<(Vec<Vec<f32>>, usize)> {
    let mut vectors = Vec::with_capacity(texts.len());
    let total = texts.len().div_ceil(batch_size.max(1));
    for (i, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let embedded = provider
            .embed(batch, EmbedIntent::Document)
            .await
            .with_context(|| format!("embedding batch {}/{} failed", i + 1, total))?;
        embedding::check_vectors(&embedded, batch.len(), provider.dims())?;
        vectors.extend(embedded);
        tracing::info!("embedded batch {}/{}", i + 1, total);
    }
    Ok((vectors, total))
}

fn component_index_record(record: &ComponentRecord, embedding: Vec<f32>) -> SemanticIndexRecord {
    SemanticIndexRecord {
        category: Category::Component,
        source_id: record.id.clone(),
        title: record.name.clone(),
        content: record.embedding_text.clone(),
        embedding,
        metadata: serde_json::json!({
            "platform": record.platform,
            "originRepo": record.origin_repo,
            "filePath": record.file_path,
            "tokens": record.tokens,
            "patterns": record.patterns,
            "semanticPosition": record.semantic_position,
        }),
        platform_tags: vec![record.platform.clone()],
    }
}

/// Run ingestion with an already constructed provider.
pub async fn ingest(
    config: &Config,
    provider: &dyn EmbeddingProvider,
    dry_run: bool,
) -> Result<IngestSummary> {
    let space = store::load_design_space(&config.data.design_space)?;

    let mut records = extract::extract_components(config, &space)?;
    let graph = build_graph(&mut records);
    tracing::info!(
        "extracted {} components, {} graph edges",
        records.len(),
        graph.edges.len()
    );

    let mut documents: Vec<SeedDocument> = match &config.data.corpus {
        Some(path) => corpus::load_corpus(path)?,
        None => Vec::new(),
    };
    let synthesized = corpus::platform_identity_documents(&space, &documents);
    documents.extend(synthesized);

    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for doc in &documents {
        *categories.entry(doc.category.as_str().to_string()).or_default() += 1;
    }
    if !records.is_empty() {
        categories.insert(Category::Component.as_str().to_string(), records.len());
    }

    let mut summary = IngestSummary {
        dry_run,
        semantic: provider.is_semantic(),
        components: records.len(),
        documents: documents.len(),
        graph_edges: graph.edges.len(),
        batches: 0,
        categories,
    };
    if dry_run {
        return Ok(summary);
    }

    let (component_vectors, document_vectors) = if provider.is_semantic() {
        let delay = Duration::from_millis(config.embedding.batch_delay_ms);
        let batch_size = config.embedding.batch_size;
        let texts: Vec<String> = records.iter().map(|r| r.embedding_text.clone()).collect();
        let (cv, b1) = embed_in_batches(provider, &texts, batch_size, delay).await?;
        let texts: Vec<String> = documents.iter().map(SeedDocument::embedding_text).collect();
        let (dv, b2) = embed_in_batches(provider, &texts, batch_size, delay).await?;
        summary.batches = b1 + b2;
        (cv, dv)
    } else {
        (vec![Vec::new(); records.len()], vec![Vec::new(); documents.len()])
    };

    let mut index = SemanticIndex::new();
    for (doc, vector) in documents.into_iter().zip(document_vectors) {
        if index.upsert(doc.into_record(vector)) {
            tracing::warn!("corpus document replaced an earlier one with the same key");
        }
    }
    let mut components = Vec::with_capacity(records.len());
    for (record, vector) in records.into_iter().zip(component_vectors) {
        index.upsert(component_index_record(&record, vector.clone()));
        components.push(EmbeddedComponent {
            record,
            embedding: vector,
        });
    }

    // Upserts may have collapsed duplicate corpus keys.
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for r in index.records() {
        *counts.entry(r.category.as_str().to_string()).or_default() += 1;
    }
    summary.categories = counts;

    let manifest = Manifest {
        generated_at: Utc::now(),
        provider: config.embedding.provider.clone(),
        model: provider.model_name().to_string(),
        dims: provider.dims(),
        semantic: provider.is_semantic(),
        components: components.len(),
        categories: summary.categories.clone(),
        graph_edges: graph.edges.len(),
        repos: config.repos.keys().cloned().collect(),
    };
    store::write_snapshot(
        &config.data.dir,
        &Snapshot {
            index: index.into_records(),
            components,
            graph,
            manifest,
        },
    )?;
    Ok(summary)
}

/// `sextant ingest`: build the provider from config, ingest, print counts.
pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    let provider = embedding::create_provider(&config.embedding)?;
    let summary = ingest(config, provider.as_ref(), dry_run).await?;

    if summary.dry_run {
        println!("ingest (dry-run)");
    } else {
        println!("ingest");
    }
    println!("  components: {}", summary.components);
    println!("  corpus documents: {}", summary.documents);
    println!("  graph edges: {}", summary.graph_edges);
    for (category, count) in &summary.categories {
        println!("  {}: {}", category, count);
    }
    if !summary.dry_run {
        if summary.semantic {
            println!("  embedding batches: {}", summary.batches);
        } else {
            println!("  embeddings: none (provider disabled, local mode)");
        }
        println!("  written to: {}", config.data.dir.display());
    }
    println!("ok");
    Ok(())
}
