//! TOML configuration.
//!
//! ```toml
//! [data]
//! dir = "./data"
//! design_space = "./config/design-space.json"
//! corpus = "./config/corpus.json"
//!
//! [embedding]
//! provider = "disabled"   # disabled | openai | ollama | voyage | local
//!
//! [navigator]
//! match_threshold = 0.3
//!
//! [repos.hud]
//! root = "../hud"
//! dirs = ["src/components"]
//! ```
//!
//! Every section except `[data]` is optional. [`load_config`] validates the
//! whole file once; later code trusts the values.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sextant_core::navigator::MAX_INTERPOLATION_STEPS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub navigator: NavigatorConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub repos: BTreeMap<String, RepoConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Directory holding `index.json`, `components.json`, `graph.json`
    /// and `manifest.json`.
    pub dir: PathBuf,
    pub design_space: PathBuf,
    #[serde(default)]
    pub corpus: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_batch_delay_ms() -> u64 {
    250
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Defaults applied when a query does not specify its own.
#[derive(Debug, Deserialize, Clone)]
pub struct NavigatorConfig {
    #[serde(default = "default_match_limit")]
    pub match_limit: usize,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default = "default_explore_limit")]
    pub explore_limit: usize,
    #[serde(default = "default_interpolate_steps")]
    pub interpolate_steps: usize,
    #[serde(default = "default_position_limit")]
    pub position_limit: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            match_limit: default_match_limit(),
            match_threshold: default_match_threshold(),
            explore_limit: default_explore_limit(),
            interpolate_steps: default_interpolate_steps(),
            position_limit: default_position_limit(),
        }
    }
}

fn default_match_limit() -> usize {
    5
}
fn default_match_threshold() -> f64 {
    0.3
}
fn default_explore_limit() -> usize {
    5
}
fn default_interpolate_steps() -> usize {
    4
}
fn default_position_limit() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default = "default_large_file_lines")]
    pub large_file_lines: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            large_file_lines: default_large_file_lines(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    ["tsx", "ts", "jsx", "js", "css", "scss", "vue", "svelte", "html"]
        .iter()
        .map(|ext| format!("**/*.{}", ext))
        .collect()
}
fn default_large_file_lines() -> usize {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepoConfig {
    pub root: PathBuf,
    /// Allow-listed sub-directories; empty walks the whole root.
    #[serde(default)]
    pub dirs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let emb = &config.embedding;
    match emb.provider.as_str() {
        "disabled" | "openai" | "ollama" | "voyage" | "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, voyage, or local.",
            other
        ),
    }

    if emb.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    // Local models have built-in defaults; network providers need both.
    if matches!(emb.provider.as_str(), "openai" | "ollama" | "voyage") {
        if emb.dims.is_none() || emb.dims == Some(0) {
            bail!("embedding.dims must be > 0 when provider is '{}'", emb.provider);
        }
        if emb.model.is_none() {
            bail!(
                "embedding.model must be specified when provider is '{}'",
                emb.provider
            );
        }
    }

    let nav = &config.navigator;
    if !(0.0..=1.01).contains(&nav.match_threshold) {
        bail!("navigator.match_threshold must be in [0.0, 1.01]");
    }
    if nav.interpolate_steps == 0 || nav.interpolate_steps > MAX_INTERPOLATION_STEPS {
        bail!(
            "navigator.interpolate_steps must be in [1, {}]",
            MAX_INTERPOLATION_STEPS
        );
    }
    if nav.match_limit == 0 || nav.explore_limit == 0 || nav.position_limit == 0 {
        bail!("navigator limits must be >= 1");
    }

    if config.extract.include_globs.is_empty() {
        bail!("extract.include_globs must not be empty");
    }

    for (name, repo) in &config.repos {
        if name.is_empty() || name.contains(':') {
            bail!("repo name '{}' must be non-empty and must not contain ':'", name);
        }
        if repo.dirs.iter().any(|d| Path::new(d).is_absolute()) {
            bail!("repos.{}.dirs must be relative to the repo root", name);
        }
    }

    Ok(())
}
