//! CLI front-ends for the query operations.
//!
//! Each `run_*` function loads a [`ToolContext`], runs one engine operation,
//! and prints the result to stdout: a short human-readable summary by
//! default, or the full JSON response with `--json`.

use anyhow::{Context, Result};
use serde::Serialize;

use sextant_core::embedding::ScoringMode;
use sextant_core::models::{PartialPosition, SemanticPosition};
use sextant_core::navigator::{ComponentMatch, PositionMatch};

use crate::config::Config;
use crate::tools::{ToolContext, ToolRegistry};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn mode_label(mode: ScoringMode) -> &'static str {
    match mode {
        ScoringMode::Semantic => "semantic",
        ScoringMode::Local => "local (keyword)",
    }
}

fn format_position(p: &SemanticPosition) -> String {
    format!(
        "terminal_organic={:+.2} minimal_dense={:+.2} cool_warm={:+.2} static_animated={:+.2}",
        p.terminal_organic, p.minimal_dense, p.cool_warm, p.static_animated
    )
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        println!("{}: (none)", label);
    } else {
        println!("{}: {}", label, items.join(", "));
    }
}

fn print_component_match(i: usize, m: &ComponentMatch) {
    println!(
        "{}. [{:.3}] {} ({}) {}",
        i + 1,
        m.similarity,
        m.name,
        m.platform,
        m.file_path
    );
    if !m.description.is_empty() {
        println!("    {}", m.description);
    }
    println!("    id: {}", m.id);
}

fn print_position_matches(results: &[PositionMatch]) {
    if results.is_empty() {
        println!("No components.");
        return;
    }
    for (i, r) in results.iter().enumerate() {
        println!("{}. [{:.3}] {} ({})", i + 1, r.similarity, r.name, r.platform);
        println!("    {}", format_position(&r.semantic_position));
    }
}

pub async fn run_match(
    config: &Config,
    query: &str,
    platform: Option<&str>,
    limit: Option<usize>,
    threshold: Option<f64>,
    json: bool,
) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let limit = limit.unwrap_or(ctx.settings().match_limit);
    let threshold = threshold.unwrap_or(ctx.settings().match_threshold);
    let result = ctx
        .navigator()
        .match_reference(query, platform, limit, threshold)
        .await?;
    if json {
        return print_json(&result);
    }

    println!("mode: {}", mode_label(result.mode));
    if result.matches.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, m) in result.matches.iter().enumerate() {
        print_component_match(i, m);
    }
    println!();
    print_list("tokens", &result.recommended_tokens);
    print_list("patterns", &result.recommended_patterns);
    if let Some(path) = &result.implementation_path {
        println!();
        println!("{}", path);
    }
    Ok(())
}

pub async fn run_project(
    config: &Config,
    reference: &str,
    platforms: &[String],
    json: bool,
) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let targets = if platforms.is_empty() {
        None
    } else {
        Some(platforms)
    };
    let result = ctx
        .navigator()
        .project(reference, targets, ctx.settings().match_threshold)
        .await?;
    if json {
        return print_json(&result);
    }

    println!("mode: {}", mode_label(result.mode));
    match &result.base_match {
        Some(base) => println!("base match: {} ({}) [{:.3}]", base.name, base.platform, base.similarity),
        None => println!("base match: (none)"),
    }
    for p in &result.projections {
        println!();
        println!("== {} ==", p.platform_name);
        println!("{}", p.description);
        let names: Vec<String> = p.components.iter().map(|c| c.name.clone()).collect();
        print_list("components", &names);
        print_list("tokens", &p.tokens);
        print_list("patterns", &p.patterns);
        println!("position: {}", format_position(&p.position_adjustments));
    }
    Ok(())
}

pub fn run_interpolate(
    config: &Config,
    from: &str,
    to: &str,
    steps: Option<usize>,
    json: bool,
) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let steps = steps.unwrap_or(ctx.settings().interpolate_steps);
    let result = ctx.navigator().interpolate(from, to, steps)?;
    if json {
        return print_json(&result);
    }

    println!("{} → {}", result.from, result.to);
    for step in &result.steps {
        println!();
        println!("ratio {:.2}: {}", step.ratio, step.description);
        println!("    {}", format_position(&step.position));
        println!("    tokens: {}", step.tokens.join(", "));
        println!("    patterns: {}", step.patterns.join(", "));
    }
    Ok(())
}

pub fn run_explore(
    config: &Config,
    position: &PartialPosition,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let limit = limit.unwrap_or(ctx.settings().explore_limit);
    let result = ctx.navigator().explore(position, limit);
    if json {
        return print_json(&result);
    }

    println!("position: {}", format_position(&result.position));
    match &result.nearest_platform {
        Some(p) => println!("nearest platform: {} [{:.3}]", p.name, p.similarity),
        None => println!("nearest platform: (none)"),
    }
    print_list("tokens", &result.suggested_tokens);
    print_list("patterns", &result.suggested_patterns);
    println!();
    print_position_matches(&result.nearby_components);
    Ok(())
}

pub fn run_position(
    config: &Config,
    position: &PartialPosition,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let limit = limit.unwrap_or(ctx.settings().position_limit);
    let results = ctx.navigator().search_by_position(position, limit);
    if json {
        return print_json(&results);
    }
    print_position_matches(&results);
    Ok(())
}

pub async fn run_anchors(config: &Config, request: &str, json: bool) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let result = ctx.validator().anchor_activation(request).await?;
    if json {
        return print_json(&result);
    }

    println!("mode: {}", mode_label(result.mode));
    if result.anchors.is_empty() {
        println!("No anchors.");
    }
    for a in &result.anchors {
        println!("  {:<20} {:.3}", a.anchor, a.score);
    }
    Ok(())
}

pub async fn run_detect(config: &Config, request: &str, json: bool) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let result = ctx.validator().detect_platform(request).await?;
    if json {
        return print_json(&result);
    }

    println!("mode: {}", mode_label(result.mode));
    match &result.platform {
        Some(p) => println!("platform: {} [{:.3}]", p, result.score),
        None => println!("platform: (undetected)"),
    }
    if let Some(r) = &result.runner_up {
        println!("runner-up: {} [{:.3}]", r.platform, r.score);
    }
    Ok(())
}

pub async fn run_drift(config: &Config, request: &str, platform: &str, json: bool) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let result = ctx.validator().drift(request, platform).await?;
    if json {
        return print_json(&result);
    }

    println!("mode: {}", mode_label(result.mode));
    println!("platform: {}", result.platform);
    if !result.fingerprint_found {
        println!("fingerprint: (missing, neutral drift)");
    }
    println!("drift: {:.3} ({})", result.drift, result.status.as_str());
    Ok(())
}

pub async fn run_validate(
    config: &Config,
    request: &str,
    platform: Option<&str>,
    json: bool,
) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let report = ctx.validator().validate(request, platform).await?;
    if json {
        return print_json(&report);
    }

    println!("mode: {}", mode_label(report.mode));
    match &report.drift {
        Some(d) => println!(
            "platform: {}  drift: {:.3} ({})",
            d.platform,
            d.drift,
            d.status.as_str()
        ),
        None => println!("platform: (undetected)"),
    }
    let anchors: Vec<String> = report
        .top_anchors
        .iter()
        .map(|a| format!("{} {:.3}", a.anchor, a.score))
        .collect();
    print_list("anchors", &anchors);
    print_list("antipatterns", &report.antipatterns);
    print_list("suggested patterns", &report.suggested_patterns);
    print_list("suggested components", &report.suggested_components);
    println!("{}", if report.passed { "PASS" } else { "FAIL" });
    Ok(())
}

pub fn run_component(config: &Config, id: &str, json: bool) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let r = &ctx.catalog().resolve_component(id)?.record;
    if json {
        return print_json(r);
    }

    println!("--- Component ---");
    println!("id:           {}", r.id);
    println!("name:         {}", r.name);
    println!("platform:     {}", r.platform);
    println!("repo:         {}", r.origin_repo);
    println!("file:         {}", r.file_path);
    println!("lines:        {}", r.line_count);
    println!("position:     {}", format_position(&r.semantic_position));
    println!();
    println!("{}", r.description);
    println!("{}", r.visual_characteristics);
    println!();
    print_list("tokens", &r.tokens);
    print_list("patterns", &r.patterns);
    print_list("anchors", &r.anchors);
    print_list("related", &r.related_components);
    for rule in &r.rules {
        println!("rule: {}", rule);
    }
    Ok(())
}

pub fn run_components(config: &Config, platform: Option<&str>, json: bool) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let components = ctx.catalog().components(platform);
    if json {
        return print_json(&components);
    }

    if components.is_empty() {
        println!("No components.");
        return Ok(());
    }
    println!("{:<32} {:<14} FILE", "ID", "PLATFORM");
    for c in &components {
        println!("{:<32} {:<14} {}", c.id, c.platform, c.file_path);
    }
    println!();
    println!("{} components", components.len());
    Ok(())
}

pub fn run_design_space(config: &Config) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    print_json(ctx.catalog().design_space())
}

pub fn run_graph(config: &Config, json: bool) -> Result<()> {
    let ctx = ToolContext::from_config(config)?;
    let graph = ctx.catalog().graph();
    if json {
        return print_json(graph);
    }

    println!("nodes: {}", graph.nodes.len());
    println!("edges: {}", graph.edges.len());
    println!("  imports: {}", graph.count_by_kind("imports"));
    println!("  shares:  {}", graph.count_by_kind("shares"));
    println!("  sibling: {}", graph.count_by_kind("sibling"));
    for e in &graph.edges {
        println!("{} -[{}]-> {}", e.source, e.relationship, e.target);
    }
    Ok(())
}

pub fn run_tools(json: bool) -> Result<()> {
    let registry = ToolRegistry::with_builtins();
    if json {
        let listing: Vec<serde_json::Value> = registry
            .tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "builtin": t.is_builtin(),
                    "parameters": t.parameters_schema(),
                })
            })
            .collect();
        return print_json(&listing);
    }
    for t in registry.tools() {
        println!("{:<20} {}", t.name(), t.description());
    }
    Ok(())
}

/// `sextant call <tool> <json>`: dispatch through the tool registry.
pub async fn run_call(config: &Config, tool: &str, params: &str) -> Result<()> {
    let params: serde_json::Value =
        serde_json::from_str(params).with_context(|| "tool parameters must be a JSON object")?;
    let ctx = ToolContext::from_config(config)?;
    let result = ToolRegistry::with_builtins().call(tool, params, &ctx).await?;
    print_json(&result)
}
