//! Tool trait, context, registry, and the built-in tools.
//!
//! A [`Tool`] is a named operation with a JSON Schema for its parameters and
//! an async `execute` that takes and returns JSON. The [`ToolRegistry`] is the
//! seam a protocol host plugs into: it lists tools with their schemas and
//! dispatches calls by name.
//!
//! # Built-in tools
//!
//! | Name | Engine operation |
//! |------|------------------|
//! | `match` | [`Navigator::match_reference`] |
//! | `project` | [`Navigator::project`] |
//! | `interpolate` | [`Navigator::interpolate`] |
//! | `explore` | [`Navigator::explore`] |
//! | `search_by_position` | [`Navigator::search_by_position`] |
//! | `anchor_activation` | [`Validator::anchor_activation`] |
//! | `detect_platform` | [`Validator::detect_platform`] |
//! | `drift` | [`Validator::drift`] |
//! | `validate` | [`Validator::validate`] |
//! | `get_component` | component lookup by id or name |
//! | `list_components` | component list, optionally by platform |
//! | `design_space` | the design space definition |
//! | `component_graph` | the component relationship graph |
//!
//! Custom tools implement [`Tool`] and are added with
//! [`ToolRegistry::register`].

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use sextant_core::embedding::{EmbeddingProvider, KeywordProvider};
use sextant_core::models::{Axis, PartialPosition};
use sextant_core::navigator::MAX_INTERPOLATION_STEPS;
use sextant_core::{Catalog, Navigator, Validator};

use crate::config::{Config, NavigatorConfig};
use crate::embedding::create_provider;
use crate::store::{load_catalog, load_manifest, Manifest};

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, used for dispatch.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// `true` for the tools registered by [`ToolRegistry::with_builtins`].
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema of the parameters object.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Shared, read-only state handed to every tool call.
pub struct ToolContext {
    catalog: Arc<Catalog>,
    provider: Arc<dyn EmbeddingProvider>,
    settings: NavigatorConfig,
}

impl ToolContext {
    pub fn new(
        catalog: Arc<Catalog>,
        provider: Arc<dyn EmbeddingProvider>,
        settings: NavigatorConfig,
    ) -> Self {
        Self {
            catalog,
            provider,
            settings,
        }
    }

    /// Load the persisted catalog and build the configured provider.
    ///
    /// When the index on disk was embedded in a different vector space than
    /// the configured provider produces, the context serves in local mode
    /// (see [`serving_provider`]).
    pub fn from_config(config: &Config) -> Result<Self> {
        let manifest = load_manifest(&config.data.dir).unwrap_or_else(|e| {
            tracing::warn!("{:#}", e);
            None
        });
        let provider = serving_provider(manifest.as_ref(), create_provider(&config.embedding)?);
        Ok(Self::new(
            Arc::new(load_catalog(config)),
            provider,
            config.navigator.clone(),
        ))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &NavigatorConfig {
        &self.settings
    }

    pub fn navigator(&self) -> Navigator<'_> {
        Navigator::new(&self.catalog, self.provider.as_ref())
    }

    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.catalog, self.provider.as_ref())
    }
}

/// The provider queries are scored with, given the index manifest.
///
/// Query vectors are only comparable with stored vectors from the same
/// model. If the index was built without embeddings, or with a different
/// dimensionality, a semantic provider is swapped for the keyword stub and
/// a warning names the mismatch. Every response then reports `local` mode.
pub fn serving_provider(
    manifest: Option<&Manifest>,
    provider: Arc<dyn EmbeddingProvider>,
) -> Arc<dyn EmbeddingProvider> {
    let Some(manifest) = manifest else {
        return provider;
    };
    if !provider.is_semantic() {
        return provider;
    }
    if !manifest.semantic {
        tracing::warn!(
            "index was built without embeddings but provider '{}' is configured; \
             serving in local mode until `sextant ingest` is re-run",
            provider.model_name()
        );
        return Arc::new(KeywordProvider);
    }
    if manifest.dims != provider.dims() {
        tracing::warn!(
            "index was embedded by '{}' ({} dims) but provider '{}' produces {} dims; \
             serving in local mode until `sextant ingest` is re-run",
            manifest.model,
            manifest.dims,
            provider.model_name(),
            provider.dims()
        );
        return Arc::new(KeywordProvider);
    }
    provider
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter helpers
// ═══════════════════════════════════════════════════════════════════════

fn required_str<'p>(params: &'p Value, key: &str) -> Result<&'p str> {
    let value = params[key].as_str().unwrap_or("");
    if value.trim().is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(value)
}

fn optional_str<'p>(params: &'p Value, key: &str) -> Option<&'p str> {
    params[key].as_str().filter(|s| !s.trim().is_empty())
}

fn usize_or(params: &Value, key: &str, default: usize) -> Result<usize> {
    match &params[key] {
        Value::Null => Ok(default),
        v => match v.as_u64() {
            Some(n) if n > 0 => Ok(n as usize),
            _ => bail!("{} must be a positive integer", key),
        },
    }
}

fn f64_or(params: &Value, key: &str, default: f64) -> Result<f64> {
    match &params[key] {
        Value::Null => Ok(default),
        v => v
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("{} must be a number", key)),
    }
}

/// Axis values read from the top level of `params`; missing axes are
/// unspecified.
fn position_param(params: &Value) -> Result<PartialPosition> {
    let mut pos = PartialPosition::default();
    for axis in Axis::ALL {
        let value = match &params[axis.id()] {
            Value::Null => continue,
            v => v
                .as_f64()
                .ok_or_else(|| anyhow::anyhow!("{} must be a number", axis.id()))?,
        };
        if !(-1.0..=1.0).contains(&value) {
            bail!("{} must be in [-1, 1]", axis.id());
        }
        let slot = match axis {
            Axis::TerminalOrganic => &mut pos.terminal_organic,
            Axis::MinimalDense => &mut pos.minimal_dense,
            Axis::CoolWarm => &mut pos.cool_warm,
            Axis::StaticAnimated => &mut pos.static_animated,
        };
        *slot = Some(value);
    }
    Ok(pos)
}

fn position_schema(extra: Value) -> Value {
    let mut properties = serde_json::Map::new();
    for axis in Axis::ALL {
        let (neg, pos) = axis.poles();
        properties.insert(
            axis.id().to_string(),
            json!({
                "type": "number", "minimum": -1.0, "maximum": 1.0,
                "description": format!("-1 = {}, +1 = {}; omitted = 0", neg, pos)
            }),
        );
    }
    if let Value::Object(more) = extra {
        properties.extend(more);
    }
    json!({ "type": "object", "properties": properties })
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations: navigator
// ═══════════════════════════════════════════════════════════════════════

pub struct MatchTool;

#[async_trait]
impl Tool for MatchTool {
    fn name(&self) -> &str {
        "match"
    }

    fn description(&self) -> &str {
        "Find components similar to a free-text reference, with recommended tokens and patterns"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Free-text reference" },
                "platform": { "type": "string", "description": "Restrict to this platform plus shared components" },
                "limit": { "type": "integer", "description": "Max matches" },
                "threshold": { "type": "number", "description": "Minimum similarity" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let limit = usize_or(&params, "limit", ctx.settings.match_limit)?;
        let threshold = f64_or(&params, "threshold", ctx.settings.match_threshold)?;
        let result = ctx
            .navigator()
            .match_reference(query, optional_str(&params, "platform"), limit, threshold)
            .await?;
        Ok(serde_json::to_value(result)?)
    }
}

pub struct ProjectTool;

#[async_trait]
impl Tool for ProjectTool {
    fn name(&self) -> &str {
        "project"
    }

    fn description(&self) -> &str {
        "Project a reference into each platform's visual language"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reference": { "type": "string", "description": "Free-text reference" },
                "platforms": {
                    "type": "array", "items": { "type": "string" },
                    "description": "Target platforms, in output order; default all"
                }
            },
            "required": ["reference"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let reference = required_str(&params, "reference")?;
        let platforms: Option<Vec<String>> = match &params["platforms"] {
            Value::Null => None,
            v => Some(serde_json::from_value(v.clone())?),
        };
        let result = ctx
            .navigator()
            .project(reference, platforms.as_deref(), ctx.settings.match_threshold)
            .await?;
        Ok(serde_json::to_value(result)?)
    }
}

pub struct InterpolateTool;

#[async_trait]
impl Tool for InterpolateTool {
    fn name(&self) -> &str {
        "interpolate"
    }

    fn description(&self) -> &str {
        "Blend two components step by step: position, tokens, patterns"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "from": { "type": "string", "description": "Component id or name (ratio 0)" },
                "to": { "type": "string", "description": "Component id or name (ratio 1)" },
                "steps": {
                    "type": "integer", "minimum": 1, "maximum": MAX_INTERPOLATION_STEPS,
                    "description": "Number of intervals"
                }
            },
            "required": ["from", "to"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let from = required_str(&params, "from")?;
        let to = required_str(&params, "to")?;
        let steps = usize_or(&params, "steps", ctx.settings.interpolate_steps)?;
        let result = ctx.navigator().interpolate(from, to, steps)?;
        Ok(serde_json::to_value(result)?)
    }
}

pub struct ExploreTool;

#[async_trait]
impl Tool for ExploreTool {
    fn name(&self) -> &str {
        "explore"
    }

    fn description(&self) -> &str {
        "Describe a point of the design space: nearest platform, nearby components, suggested tokens"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        position_schema(json!({ "limit": { "type": "integer", "description": "Max nearby components" } }))
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let position = position_param(&params)?;
        let limit = usize_or(&params, "limit", ctx.settings.explore_limit)?;
        Ok(serde_json::to_value(ctx.navigator().explore(&position, limit))?)
    }
}

pub struct SearchByPositionTool;

#[async_trait]
impl Tool for SearchByPositionTool {
    fn name(&self) -> &str {
        "search_by_position"
    }

    fn description(&self) -> &str {
        "Components nearest a semantic position"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        position_schema(json!({ "limit": { "type": "integer", "description": "Max results" } }))
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let position = position_param(&params)?;
        let limit = usize_or(&params, "limit", ctx.settings.position_limit)?;
        let results = ctx.navigator().search_by_position(&position, limit);
        Ok(json!({ "results": results }))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations: validation
// ═══════════════════════════════════════════════════════════════════════

fn request_schema(with_platform: bool, platform_required: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "request": { "type": "string", "description": "Free-text design request" }
        },
        "required": ["request"]
    });
    if with_platform {
        schema["properties"]["platform"] = json!({ "type": "string", "description": "Platform id" });
        if platform_required {
            schema["required"] = json!(["request", "platform"]);
        }
    }
    schema
}

pub struct AnchorActivationTool;

#[async_trait]
impl Tool for AnchorActivationTool {
    fn name(&self) -> &str {
        "anchor_activation"
    }

    fn description(&self) -> &str {
        "Score every brand anchor against a request"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        request_schema(false, false)
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let request = required_str(&params, "request")?;
        Ok(serde_json::to_value(ctx.validator().anchor_activation(request).await?)?)
    }
}

pub struct DetectPlatformTool;

#[async_trait]
impl Tool for DetectPlatformTool {
    fn name(&self) -> &str {
        "detect_platform"
    }

    fn description(&self) -> &str {
        "Detect which platform a request belongs to"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        request_schema(false, false)
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let request = required_str(&params, "request")?;
        Ok(serde_json::to_value(ctx.validator().detect_platform(request).await?)?)
    }
}

pub struct DriftTool;

#[async_trait]
impl Tool for DriftTool {
    fn name(&self) -> &str {
        "drift"
    }

    fn description(&self) -> &str {
        "Measure how far a request drifts from a platform's identity"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        request_schema(true, true)
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let request = required_str(&params, "request")?;
        let platform = required_str(&params, "platform")?;
        Ok(serde_json::to_value(ctx.validator().drift(request, platform).await?)?)
    }
}

pub struct ValidateTool;

#[async_trait]
impl Tool for ValidateTool {
    fn name(&self) -> &str {
        "validate"
    }

    fn description(&self) -> &str {
        "Full validation: detection, anchors, drift, antipatterns, suggestions"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        request_schema(true, false)
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let request = required_str(&params, "request")?;
        let report = ctx
            .validator()
            .validate(request, optional_str(&params, "platform"))
            .await?;
        Ok(serde_json::to_value(report)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations: read accessors
// ═══════════════════════════════════════════════════════════════════════

pub struct GetComponentTool;

#[async_trait]
impl Tool for GetComponentTool {
    fn name(&self) -> &str {
        "get_component"
    }

    fn description(&self) -> &str {
        "Retrieve one component by id or name"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Component id (repo:name) or name" }
            },
            "required": ["id"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = required_str(&params, "id")?;
        let component = ctx.catalog.resolve_component(id)?;
        Ok(serde_json::to_value(&component.record)?)
    }
}

pub struct ListComponentsTool;

#[async_trait]
impl Tool for ListComponentsTool {
    fn name(&self) -> &str {
        "list_components"
    }

    fn description(&self) -> &str {
        "List components, optionally for one platform"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "platform": { "type": "string", "description": "Platform id" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let components = ctx.catalog.components(optional_str(&params, "platform"));
        Ok(json!({ "count": components.len(), "components": components }))
    }
}

pub struct DesignSpaceTool;

#[async_trait]
impl Tool for DesignSpaceTool {
    fn name(&self) -> &str {
        "design_space"
    }

    fn description(&self) -> &str {
        "The design space: axes with their poles and platform canonical positions"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(serde_json::to_value(ctx.catalog.design_space())?)
    }
}

pub struct ComponentGraphTool;

#[async_trait]
impl Tool for ComponentGraphTool {
    fn name(&self) -> &str {
        "component_graph"
    }

    fn description(&self) -> &str {
        "The component relationship graph (imports, shared patterns, siblings)"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(serde_json::to_value(ctx.catalog.graph())?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MatchTool));
        registry.register(Box::new(ProjectTool));
        registry.register(Box::new(InterpolateTool));
        registry.register(Box::new(ExploreTool));
        registry.register(Box::new(SearchByPositionTool));
        registry.register(Box::new(AnchorActivationTool));
        registry.register(Box::new(DetectPlatformTool));
        registry.register(Box::new(DriftTool));
        registry.register(Box::new(ValidateTool));
        registry.register(Box::new(GetComponentTool));
        registry.register(Box::new(ListComponentsTool));
        registry.register(Box::new(DesignSpaceTool));
        registry.register(Box::new(ComponentGraphTool));
        registry
    }

    /// Add a tool. A tool whose name is already taken is rejected.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> bool {
        if self.find(tool.name()).is_some() {
            tracing::warn!("tool '{}' already registered; ignoring", tool.name());
            return false;
        }
        self.tools.push(tool);
        true
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Execute the tool called `name`.
    pub async fn call(&self, name: &str, params: Value, ctx: &ToolContext) -> Result<Value> {
        match self.find(name) {
            Some(tool) => tool.execute(params, ctx).await,
            None => bail!("Unknown tool: '{}'", name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
