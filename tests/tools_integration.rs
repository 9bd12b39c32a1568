//! Library-level tests: semantic ingestion with an in-process provider, the
//! all-or-nothing ingest guarantee, and tool dispatch through the registry.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use sextant::config::{self, Config};
use sextant::ingest;
use sextant::store::{self, COMPONENTS_FILE, INDEX_FILE};
use sextant::tools::{Tool, ToolContext, ToolRegistry};
use sextant_core::embedding::{EmbedIntent, EmbeddingProvider, KeywordProvider};

const DIMS: usize = 256;

/// Bag-of-words hashing embedder: deterministic, no network.
struct BagProvider;

fn bucket(word: &str) -> usize {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    (h % DIMS as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for BagProvider {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }

    fn dims(&self) -> usize {
        DIMS
    }

    async fn embed(&self, texts: &[String], _intent: EmbedIntent) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIMS];
                for word in text
                    .to_lowercase()
                    .split(|c: char| !c.is_ascii_alphanumeric())
                    .filter(|w| w.len() >= 4)
                {
                    v[bucket(word)] += 1.0;
                }
                let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm > 0.0 {
                    v.iter_mut().for_each(|x| *x /= norm);
                }
                v
            })
            .collect())
    }
}

struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn dims(&self) -> usize {
        DIMS
    }

    async fn embed(&self, _texts: &[String], _intent: EmbedIntent) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("Voyage API error 401: invalid key")
    }
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn setup() -> (TempDir, Config) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");

    let hud = root.join("hud");
    write(
        &hud,
        "src/components/sentinel/Radar.tsx",
        "/** @description Radar sweep with scanlines */\nimport { Frame } from '../shared/Frame';\nexport const Radar = () => <Frame className=\"scanlines\" />;\n",
    );
    write(
        &hud,
        "src/components/astrolabe/BrassDial.tsx",
        "/** @description Engraved dial with a sweeping needle */\nexport const BrassDial = () => <svg style={{ fill: 'var(--color-brass-500)' }} />;\n",
    );
    write(
        &hud,
        "src/components/shared/Frame.tsx",
        "/** @description Frame with corner brackets */\nexport const Frame = () => <div className=\"corner-brackets\" />;\n",
    );

    let config_path = root.join("sextant.toml");
    fs::write(
        &config_path,
        format!(
            r#"[data]
dir = "{root}/data"
design_space = "{fixtures}/design-space.json"
corpus = "{fixtures}/corpus.json"

[embedding]
provider = "voyage"
model = "voyage-3"
dims = {dims}
batch_size = 2
batch_delay_ms = 0

[repos.hud]
root = "{root}/hud"
dirs = ["src/components"]
"#,
            root = root.display(),
            fixtures = fixtures.display(),
            dims = DIMS,
        ),
    )
    .unwrap();

    let config = config::load_config(&config_path).unwrap();
    (tmp, config)
}

fn context(config: &Config, provider: Arc<dyn EmbeddingProvider>) -> ToolContext {
    ToolContext::new(
        Arc::new(store::load_catalog(config)),
        provider,
        config.navigator.clone(),
    )
}

#[tokio::test]
async fn test_semantic_ingest_and_match() {
    let (_tmp, config) = setup();

    let summary = ingest::ingest(&config, &BagProvider, false).await.unwrap();
    assert!(summary.semantic);
    assert_eq!(summary.components, 3);
    assert!(summary.batches >= 2);
    assert_eq!(summary.categories.get("component"), Some(&3));

    let manifest = store::load_manifest(&config.data.dir).unwrap().unwrap();
    assert!(manifest.semantic);
    assert_eq!(manifest.dims, DIMS);
    assert_eq!(manifest.model, "bag-of-words");

    let ctx = context(&config, Arc::new(BagProvider));
    let registry = ToolRegistry::with_builtins();
    let result = registry
        .call(
            "match",
            json!({"query": "brass dial with a sweeping needle", "threshold": 0.0}),
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(result["mode"], "semantic");
    assert_eq!(result["matches"][0]["name"], "BrassDial");
}

#[tokio::test]
async fn test_failed_ingest_keeps_previous_snapshot() {
    let (_tmp, config) = setup();

    ingest::ingest(&config, &KeywordProvider, false).await.unwrap();
    let index_before = fs::read(config.data.dir.join(INDEX_FILE)).unwrap();
    let components_before = fs::read(config.data.dir.join(COMPONENTS_FILE)).unwrap();

    let err = ingest::ingest(&config, &FailingProvider, false)
        .await
        .unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("embedding batch 1/"), "{}", message);
    assert!(message.contains("401"), "{}", message);

    assert_eq!(fs::read(config.data.dir.join(INDEX_FILE)).unwrap(), index_before);
    assert_eq!(
        fs::read(config.data.dir.join(COMPONENTS_FILE)).unwrap(),
        components_before
    );
}

#[tokio::test]
async fn test_provider_error_is_not_masked() {
    let (_tmp, config) = setup();
    ingest::ingest(&config, &BagProvider, false).await.unwrap();

    let ctx = context(&config, Arc::new(FailingProvider));
    let registry = ToolRegistry::with_builtins();
    let err = registry
        .call("match", json!({"query": "radar"}), &ctx)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("401"));

    // Geometry-only tools never touch the provider.
    let explore = registry
        .call("explore", json!({"terminal_organic": -0.8}), &ctx)
        .await
        .unwrap();
    assert_eq!(explore["nearestPlatform"]["id"], "sentinel");
}

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Return the parameters unchanged"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> anyhow::Result<Value> {
        Ok(json!({
            "params": params,
            "components": ctx.catalog().components(None).len(),
        }))
    }
}

#[tokio::test]
async fn test_custom_tool_registration() {
    let (_tmp, config) = setup();
    ingest::ingest(&config, &KeywordProvider, false).await.unwrap();
    let ctx = context(&config, Arc::new(KeywordProvider));

    let mut registry = ToolRegistry::with_builtins();
    let builtins = registry.len();
    assert!(registry.register(Box::new(EchoTool)));
    assert!(!registry.register(Box::new(EchoTool)));
    assert_eq!(registry.len(), builtins + 1);
    assert!(!registry.find("echo").unwrap().is_builtin());

    let result = registry.call("echo", json!({"x": 1}), &ctx).await.unwrap();
    assert_eq!(result["params"]["x"], 1);
    assert_eq!(result["components"], 3);

    let err = registry.call("nope", json!({}), &ctx).await.unwrap_err();
    assert!(err.to_string().contains("Unknown tool: 'nope'"));
}
