//! # Sextant
//!
//! A semantic navigator for UI design components.
//!
//! Sextant scans component source trees, places every component in a
//! four-axis design space (terminal↔organic, minimal↔dense, cool↔warm,
//! static↔animated), embeds a synthesized description of each, and answers
//! questions like "what do we already have that looks like this?", "how
//! would this look on another platform?", or "does this request drift away
//! from the platform's identity?".
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │ Repos       │──▶│ Extract      │──▶│ data/*.json│
//! │ + corpus    │   │ Graph+Embed  │   │ (snapshot) │
//! └─────────────┘   └──────────────┘   └─────┬──────┘
//!                                            │ load_catalog
//!                                            ▼
//!                   ┌──────────────┐   ┌────────────┐
//!                   │ CLI / tools  │──▶│ Navigator  │
//!                   │              │   │ Validator  │
//!                   └──────────────┘   └────────────┘
//! ```
//!
//! The engines, models, and geometry live in [`sextant_core`]; this crate
//! adds everything that touches the filesystem, the network, or the user.
//!
//! ## Quick Start
//!
//! ```bash
//! sextant ingest                          # extract + embed + write index
//! sextant match "brass gauge with a sweeping needle"
//! sextant project "threat radar" --platform astrolabe --platform loom
//! sextant explore --cool-warm 0.5
//! sextant validate "rainbow lorem ipsum hero" --platform sentinel
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`heuristics`] | Regex token / pattern / import / keyword detection |
//! | [`extract`] | Source tree walk and component record synthesis |
//! | [`embedding`] | OpenAI, Ollama, Voyage, and local providers |
//! | [`corpus`] | Seed documents (anchors, fingerprints, …) |
//! | [`store`] | Snapshot persistence and degraded loading |
//! | [`ingest`] | The offline ingestion pipeline |
//! | [`tools`] | Tool trait, registry, and built-in tools |
//! | [`query`] | CLI query commands |
//! | [`stats`] | Index summary |

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod extract;
pub mod heuristics;
pub mod ingest;
pub mod query;
pub mod stats;
pub mod store;
pub mod tools;

pub use sextant_core;
