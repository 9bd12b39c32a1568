//! # Sextant Core
//!
//! Shared, I/O-free logic for Sextant: component and index models, the
//! semantic-position signal table, design space geometry, the component
//! graph builder, the in-memory semantic index, and the two query engines
//! (navigator and validation).
//!
//! This crate contains no tokio, filesystem, or network dependencies.
//! Loading persisted files and talking to embedding services is the job of
//! the `sextant` application crate, which hands a fully built [`Catalog`]
//! and an [`EmbeddingProvider`] to the engines here.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Component records, semantic positions, index records, fingerprints |
//! | [`position`] | Signal → axis delta table for heuristic positioning |
//! | [`design_space`] | Axes, platform canonical positions, positional similarity |
//! | [`graph`] | Import / shared-pattern / sibling relationship graph |
//! | [`index`] | Upsert-keyed record store with cosine search |
//! | [`catalog`] | The loaded, read-only bundle the engines query |
//! | [`embedding`] | Provider trait, keyword stub, and the per-request [`embedding::Lookup`] |
//! | [`navigator`] | MATCH, SEARCH-BY-POSITION, PROJECT, INTERPOLATE, EXPLORE |
//! | [`validation`] | Anchor activation, platform detection, drift, full validation |
//! | [`error`] | [`NavigatorError`] |

pub mod catalog;
pub mod design_space;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod index;
pub mod models;
pub mod navigator;
pub mod position;
pub mod validation;

pub use catalog::Catalog;
pub use embedding::{EmbedIntent, EmbeddingProvider, KeywordProvider, ScoringMode};
pub use error::NavigatorError;
pub use navigator::Navigator;
pub use validation::Validator;
