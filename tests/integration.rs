use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn sextant_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("sextant");
    path
}

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {:?}: {}", path, e))
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("design-space.json"), fixture("design-space.json")).unwrap();
    fs::write(config_dir.join("corpus.json"), fixture("corpus.json")).unwrap();

    let hud = root.join("hud");
    write(
        &hud,
        "src/components/sentinel/Radar.tsx",
        r#"/**
 * @description Radar sweep with scanlines over a threat gradient
 * @anchors vigilance, urgency
 * @rule Sweep period never below 2s
 */
import { Frame } from '../shared/Frame';
import './radar.css';

export const Radar = () => (
  <Frame className="scanlines threat-gradient" style={{ color: 'var(--color-cyan-400)' }} />
);
"#,
    );
    write(
        &hud,
        "src/components/sentinel/AlertBar.tsx",
        r#"// Alert bar for perimeter events.
export const AlertBar = () => <div className="threat-gradient" style={{ font: 'var(--font-mono)' }} />;
"#,
    );
    write(
        &hud,
        "src/components/astrolabe/BrassDial.tsx",
        r#"/** @description Engraved dial with a sweeping needle */
export const BrassDial = () => <svg style={{ fill: 'var(--color-brass-500)' }} />;
"#,
    );
    write(
        &hud,
        "src/components/loom/WovenCard.tsx",
        r#"/** @description Soft woven card that breathes */
export const WovenCard = () => <div className="breathing" style={{ borderRadius: 'var(--radius-soft)' }} />;
"#,
    );
    write(
        &hud,
        "src/components/shared/Frame.tsx",
        r#"/** @description Frame with corner brackets */
export const Frame = (props) => <div className="corner-brackets" {...props} />;
"#,
    );
    write(&hud, "src/components/node_modules/dep/Ignored.tsx", "export const Ignored = 1;");
    write(&hud, "README.md", "# hud");

    let config_content = format!(
        r#"[data]
dir = "{root}/data"
design_space = "{root}/config/design-space.json"
corpus = "{root}/config/corpus.json"

[embedding]
provider = "disabled"

[repos.hud]
root = "{root}/hud"
dirs = ["src/components"]
"#,
        root = root.display()
    );

    let config_path = config_dir.join("sextant.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_sextant(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = sextant_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run sextant binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn run_json(config_path: &Path, args: &[&str]) -> Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let (stdout, stderr, success) = run_sextant(config_path, &full);
    assert!(success, "{:?} failed: stdout={}, stderr={}", args, stdout, stderr);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("bad JSON from {:?}: {}\n{}", args, e, stdout))
}

fn ingested_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_sextant(&config_path, &["ingest"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    (tmp, config_path)
}

#[test]
fn test_ingest_writes_snapshot() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_sextant(&config_path, &["ingest"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("components: 5"));
    assert!(stdout.contains("local mode"));
    assert!(stdout.contains("ok"));

    let data = tmp.path().join("data");
    for name in ["index.json", "components.json", "graph.json", "manifest.json"] {
        assert!(data.join(name).exists(), "{} missing", name);
    }
}

#[test]
fn test_ingest_dry_run_writes_nothing() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_sextant(&config_path, &["ingest", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("components: 5"));
    assert!(!tmp.path().join("data").join("index.json").exists());
}

#[test]
fn test_queries_before_ingest_are_degraded_not_errors() {
    let (_tmp, config_path) = setup_test_env();

    let components = run_json(&config_path, &["components"]);
    assert_eq!(components, Value::Array(vec![]));

    let drift = run_json(&config_path, &["drift", "anything", "sentinel"]);
    assert_eq!(drift["drift"], 0.5);
    assert_eq!(drift["status"], "edge_case");
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_sextant(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_components_filtered_by_platform() {
    let (_tmp, config_path) = ingested_env();

    let all = run_json(&config_path, &["components"]);
    assert_eq!(all.as_array().unwrap().len(), 5);

    let sentinel = run_json(&config_path, &["components", "--platform", "sentinel"]);
    let names: Vec<&str> = sentinel
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["AlertBar", "Radar"]);
}

#[test]
fn test_component_lookup_by_name() {
    let (_tmp, config_path) = ingested_env();

    let radar = run_json(&config_path, &["component", "Radar"]);
    assert_eq!(radar["id"], "hud:Radar");
    assert_eq!(radar["platform"], "sentinel");
    assert_eq!(radar["anchors"], serde_json::json!(["vigilance", "urgency"]));
    assert_eq!(radar["patterns"], serde_json::json!(["scanlines", "threat-gradient"]));

    let (_, stderr, success) = run_sextant(&config_path, &["component", "Nope"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_graph_edges() {
    let (_tmp, config_path) = ingested_env();

    let graph = run_json(&config_path, &["graph"]);
    let edges = graph["edges"].as_array().unwrap();
    let has = |source: &str, target: &str, rel: &str| {
        edges.iter().any(|e| {
            let (s, t) = (e["source"].as_str().unwrap(), e["target"].as_str().unwrap());
            e["relationship"] == rel
                && ((s == source && t == target) || (rel != "imports" && s == target && t == source))
        })
    };
    assert!(has("hud:Radar", "hud:Frame", "imports"));
    assert!(has("hud:AlertBar", "hud:Radar", "shares-threat-gradient"));
    assert!(has("hud:AlertBar", "hud:Radar", "sibling"));
    assert_eq!(
        edges.iter().filter(|e| e["relationship"] == "sibling").count(),
        1
    );
}

#[test]
fn test_match_local_mode() {
    let (_tmp, config_path) = ingested_env();

    let result = run_json(&config_path, &["match", "brass dial"]);
    assert_eq!(result["mode"], "local");
    assert_eq!(result["matches"][0]["name"], "BrassDial");
    assert!(result["implementationPath"]
        .as_str()
        .unwrap()
        .contains("BrassDial"));

    let none = run_json(&config_path, &["match", "brass dial", "--threshold", "1.01"]);
    assert_eq!(none["matches"], Value::Array(vec![]));
}

#[test]
fn test_project_requested_order() {
    let (_tmp, config_path) = ingested_env();

    let result = run_json(
        &config_path,
        &["project", "radar", "--platform", "loom", "--platform", "nowhere", "--platform", "sentinel"],
    );
    let projections = result["projections"].as_array().unwrap();
    assert_eq!(projections.len(), 2);
    assert_eq!(projections[0]["platform"], "loom");
    assert_eq!(projections[1]["platform"], "sentinel");
    assert_eq!(projections[1]["positionAdjustments"]["terminal_organic"], -0.8);
}

#[test]
fn test_interpolate_endpoints() {
    let (_tmp, config_path) = ingested_env();

    let result = run_json(&config_path, &["interpolate", "Radar", "hud:BrassDial", "--steps", "2"]);
    let steps = result["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0]["ratio"], 0.0);
    assert_eq!(steps[0]["tokens"], serde_json::json!(["--color-cyan-400"]));
    assert_eq!(steps[2]["ratio"], 1.0);
    assert_eq!(steps[2]["tokens"], serde_json::json!(["--color-brass-500"]));
}

#[test]
fn test_keyword_index_with_semantic_provider_serves_local() {
    let (_tmp, config_path) = ingested_env();

    // Point the config at a real provider without re-ingesting.
    let content = fs::read_to_string(&config_path).unwrap().replace(
        "provider = \"disabled\"",
        "provider = \"ollama\"\nmodel = \"nomic-embed-text\"\ndims = 768\nurl = \"http://127.0.0.1:9\"",
    );
    fs::write(&config_path, content).unwrap();

    let (stdout, stderr, success) = run_sextant(&config_path, &["--json", "drift", "terminal threat radar scanlines", "sentinel"]);
    assert!(success, "drift failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stderr.contains("serving in local mode"), "{}", stderr);
    let drift: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(drift["mode"], "local");
    assert_eq!(drift["status"], "approved");

    let result = run_json(&config_path, &["match", "brass dial"]);
    assert_eq!(result["mode"], "local");
    assert_eq!(result["matches"][0]["name"], "BrassDial");
}

#[test]
fn test_interpolate_unknown_component() {
    let (_tmp, config_path) = ingested_env();

    let (_, stderr, success) = run_sextant(&config_path, &["interpolate", "Radar", "Ghost"]);
    assert!(!success);
    assert!(stderr.contains("Ghost"));
}

#[test]
fn test_explore_warm_point() {
    let (_tmp, config_path) = ingested_env();

    let result = run_json(&config_path, &["explore", "--cool-warm", "0.5"]);
    assert_eq!(result["nearestPlatform"]["id"], "astrolabe");
    let tokens: Vec<&str> = result["suggestedTokens"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert!(tokens.contains(&"--color-brass-500"));
    assert!(tokens.contains(&"--color-amber-400"));
    assert!(!tokens.contains(&"--font-mono"));
    assert!(!tokens.contains(&"--radius-soft"));
}

#[test]
fn test_position_search_is_deterministic() {
    let (_tmp, config_path) = ingested_env();

    let args = ["position", "--terminal-organic", "-0.8", "--limit", "3"];
    let first = run_json(&config_path, &args);
    let second = run_json(&config_path, &args);
    assert_eq!(first, second);
    assert_eq!(first.as_array().unwrap().len(), 3);
}

#[test]
fn test_drift_and_validate() {
    let (_tmp, config_path) = ingested_env();

    let drift = run_json(
        &config_path,
        &["drift", "terminal threat radar scanlines", "sentinel"],
    );
    assert_eq!(drift["mode"], "local");
    assert_eq!(drift["status"], "approved");

    let report = run_json(
        &config_path,
        &["validate", "rainbow lorem ipsum hero", "--platform", "sentinel"],
    );
    assert_eq!(report["passed"], false);
    let antipatterns = report["antipatterns"].as_array().unwrap();
    assert!(antipatterns.iter().any(|a| a == "rainbow"));
}

#[test]
fn test_detect_platform() {
    let (_tmp, config_path) = ingested_env();

    let result = run_json(&config_path, &["detect", "weave soft fabric thread"]);
    assert_eq!(result["platform"], "loom");
}

#[test]
fn test_stats_after_ingest() {
    let (_tmp, config_path) = ingested_env();

    let (stdout, _, success) = run_sextant(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Components:  5"));
    assert!(stdout.contains("local (keyword)"));
    assert!(stdout.contains("fingerprint"));
}

#[test]
fn test_tools_and_call() {
    let (_tmp, config_path) = ingested_env();

    let (stdout, _, success) = run_sextant(&config_path, &["tools"]);
    assert!(success);
    for name in ["match", "project", "interpolate", "explore", "validate", "component_graph"] {
        assert!(stdout.contains(name), "tool {} not listed", name);
    }

    let (stdout, stderr, success) = run_sextant(
        &config_path,
        &["call", "get_component", r#"{"id": "Frame"}"#],
    );
    assert!(success, "call failed: {}", stderr);
    let frame: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(frame["patterns"], serde_json::json!(["corner-brackets"]));

    let (_, stderr, success) = run_sextant(&config_path, &["call", "match", r#"{"query": ""}"#]);
    assert!(!success);
    assert!(stderr.contains("query must not be empty"));
}
