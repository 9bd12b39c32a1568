//! Regex heuristics over raw component source text.
//!
//! Nothing here parses syntax. Every detector is an independent regex (or
//! small regex table) run over the file text:
//!
//! | Detector | Output |
//! |----------|--------|
//! | token rules | design-token references (`--color-*`, `$space-*`, …) |
//! | pattern rules | named visual patterns (`scanlines`, `glass-blur`, …) |
//! | import rules | ES `import`, `require()` and CSS `@import` specifiers |
//! | keyword rules | terminal / organic / animation / cool / warm hits |
//! | doc header | `@description`, `@anchors`, `@rule` tags |
//!
//! The detected [`Signal`]s feed [`sextant_core::position::derive_position`].

use once_cell::sync::Lazy;
use regex::Regex;

use sextant_core::design_space::PlatformDefinition;
use sextant_core::models::SHARED_PLATFORM;
use sextant_core::position::Signal;

/// Files shorter than this count as small.
pub const SMALL_FILE_LINES: usize = 60;

const PATTERN_RULES: &[(&str, &str)] = &[
    ("corner-brackets", r"(?i)corner[-_ ]?brackets?|bracket[-_ ]?corners?"),
    ("glass-blur", r"(?i)backdrop-filter\s*:\s*blur|backdrop-blur|glass(?:morphism|[-_ ]?panel|[-_ ]?blur)"),
    ("scanlines", r"(?i)scan[-_ ]?lines?|crt[-_ ]?overlay"),
    ("particles", r"(?i)particles?\b|requestAnimationFrame|getContext\(\s*['\x22]2d|<canvas"),
    ("threat-gradient", r"(?i)threat[-_ ]?(?:gradient|level)|severity[-_ ]?gradient"),
    ("breathing", r"(?i)breath(?:e|ing)|@keyframes\s+pulse|animation\s*:[^;]*\bpulse"),
    ("grid-snap", r"(?i)grid[-_ ]?snap|snap[-_ ]?to[-_ ]?grid"),
];

const TOKEN_RULES: &[(&str, &str)] = &[
    ("css-var", r"--((?:color|font|space|spacing|radius|shadow|motion|duration|ease|glow)-[a-z0-9-]+)"),
    ("scss-var", r"\$((?:color|font|space|spacing|radius)-[a-z0-9-]+)"),
];

const IMPORT_RULES: &[(&str, &str)] = &[
    ("es-import", r#"import\s+(?:[^'";]+?\s+from\s+)?['"]([^'"]+)['"]"#),
    ("require", r#"require\(\s*['"]([^'"]+)['"]\s*\)"#),
    ("css-import", r#"@import\s+(?:url\()?\s*['"]([^'"]+)['"]"#),
];

const KEYWORD_RULES: &[(&str, &str)] = &[
    ("terminal", r"(?i)\b(?:terminal|monospace|console|crt|phosphor|ascii|command[-_ ]?line)\b"),
    ("organic", r"(?i)\b(?:organic|breath\w*|flowing|soft|natural|curved?|blob)\b"),
    ("animation", r"(?i)@keyframes|\btransition\s*:|\banimation\s*:|framer-motion|\banimate\b"),
    ("cool", r"(?i)\b(?:cyan|blue|teal|ice|frost|slate)\b"),
    ("warm", r"(?i)\b(?:amber|orange|gold|red|ember|rose)\b"),
];

/// Compile a rule table, dropping (and logging) any rule that fails.
fn compile(rules: &[(&'static str, &str)]) -> Vec<(&'static str, Regex)> {
    rules
        .iter()
        .filter_map(|(id, pattern)| match Regex::new(pattern) {
            Ok(re) => Some((*id, re)),
            Err(e) => {
                tracing::warn!("heuristic rule '{}' failed to compile: {}", id, e);
                None
            }
        })
        .collect()
}

static PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| compile(PATTERN_RULES));
static TOKENS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| compile(TOKEN_RULES));
static IMPORTS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| compile(IMPORT_RULES));
static KEYWORDS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| compile(KEYWORD_RULES));

fn keyword_hits(id: &str, text: &str) -> usize {
    KEYWORDS
        .iter()
        .find(|(k, _)| *k == id)
        .map(|(_, re)| re.find_iter(text).count())
        .unwrap_or(0)
}

fn push_unique(out: &mut Vec<String>, item: &str) {
    if !out.iter().any(|x| x == item) {
        out.push(item.to_string());
    }
}

/// Token references, first occurrence order, without the sigil.
pub fn detect_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for (_, re) in TOKENS.iter() {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                push_unique(&mut tokens, &format!("--{}", m.as_str()));
            }
        }
    }
    tokens
}

/// Ids of the visual patterns present, in rule order.
pub fn detect_patterns(text: &str) -> Vec<String> {
    PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(id, _)| id.to_string())
        .collect()
}

pub fn detect_imports(text: &str) -> Vec<String> {
    let mut imports = Vec::new();
    for (_, re) in IMPORTS.iter() {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                push_unique(&mut imports, m.as_str());
            }
        }
    }
    imports
}

/// Positioning signals present in a file.
pub fn detect_signals(text: &str, patterns: &[String], line_count: usize, large_file_lines: usize) -> Vec<Signal> {
    let has = |p: &str| patterns.iter().any(|x| x == p);
    let mut signals = Vec::new();

    if has("scanlines") {
        signals.push(Signal::ScanlinePattern);
    }
    if has("breathing") {
        signals.push(Signal::BreathingPattern);
    }
    if has("particles") {
        signals.push(Signal::ParticlePattern);
    }
    if keyword_hits("terminal", text) > 0 {
        signals.push(Signal::TerminalKeywords);
    }
    if keyword_hits("organic", text) > 0 {
        signals.push(Signal::OrganicKeywords);
    }
    if keyword_hits("animation", text) > 0 {
        signals.push(Signal::AnimationKeywords);
    }
    if keyword_hits("cool", text) > 0 {
        signals.push(Signal::CoolTokens);
    }
    if keyword_hits("warm", text) > 0 {
        signals.push(Signal::WarmTokens);
    }
    if line_count > large_file_lines {
        signals.push(Signal::LargeFile);
    } else if line_count < SMALL_FILE_LINES {
        signals.push(Signal::SmallFile);
    }
    signals
}

/// Tags parsed from a leading documentation comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocHeader {
    pub description: Option<String>,
    pub anchors: Vec<String>,
    pub rules: Vec<String>,
}

/// Parse the first comment block of a file.
///
/// Recognizes `/* … */` (including `/** … */`), runs of `//` lines and
/// `<!-- … -->`. Tags: `@description text`, `@anchors a, b`, `@rule text`
/// (repeatable). The first untagged prose line is the fallback description.
pub fn parse_doc_header(text: &str) -> DocHeader {
    let body = text.trim_start_matches('\u{feff}').trim_start();
    let lines: Vec<String> = if let Some(rest) = body.strip_prefix("/*") {
        let end = rest.find("*/").unwrap_or(rest.len());
        rest[..end]
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim().to_string())
            .collect()
    } else if body.starts_with("//") {
        body.lines()
            .map(str::trim)
            .take_while(|l| l.starts_with("//"))
            .map(|l| l.trim_start_matches('/').trim().to_string())
            .collect()
    } else if let Some(rest) = body.strip_prefix("<!--") {
        let end = rest.find("-->").unwrap_or(rest.len());
        rest[..end].lines().map(|l| l.trim().to_string()).collect()
    } else {
        return DocHeader::default();
    };

    let mut header = DocHeader::default();
    let mut prose: Option<String> = None;
    for line in lines.iter().filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("@description") {
            let d = rest.trim();
            if !d.is_empty() {
                header.description = Some(d.to_string());
            }
        } else if let Some(rest) = line.strip_prefix("@anchors") {
            for a in rest.split(',').map(|a| a.trim().to_lowercase()) {
                if !a.is_empty() {
                    push_unique(&mut header.anchors, &a);
                }
            }
        } else if let Some(rest) = line.strip_prefix("@rule") {
            let r = rest.trim();
            if !r.is_empty() {
                header.rules.push(r.to_string());
            }
        } else if !line.starts_with('@') && prose.is_none() {
            prose = Some(line.clone());
        }
    }
    if header.description.is_none() {
        header.description = prose;
    }
    header
}

/// Resolves the platform of a file from its path, then from keyword hits.
pub struct PlatformMatcher {
    platforms: Vec<(String, Option<Regex>)>,
}

impl PlatformMatcher {
    pub fn new(platforms: &[PlatformDefinition]) -> Self {
        let platforms = platforms
            .iter()
            .map(|p| {
                let words: Vec<String> = p
                    .keywords
                    .iter()
                    .filter(|k| !k.trim().is_empty())
                    .map(|k| regex::escape(k.trim()))
                    .collect();
                let re = if words.is_empty() {
                    None
                } else {
                    match Regex::new(&format!(r"(?i)\b(?:{})\b", words.join("|"))) {
                        Ok(re) => Some(re),
                        Err(e) => {
                            tracing::warn!("keywords of platform '{}' failed to compile: {}", p.id, e);
                            None
                        }
                    }
                };
                (p.id.clone(), re)
            })
            .collect();
        Self { platforms }
    }

    /// A path segment equal to a platform id wins. Otherwise the platform
    /// with the most keyword hits; no hits at all means shared. Equal
    /// positive scores keep the earlier platform.
    pub fn resolve(&self, relative_path: &str, text: &str) -> String {
        for segment in relative_path.split('/') {
            let segment = segment.to_lowercase();
            if let Some((id, _)) = self.platforms.iter().find(|(id, _)| id.to_lowercase() == segment) {
                return id.clone();
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (id, re) in &self.platforms {
            let hits = re.as_ref().map(|re| re.find_iter(text).count()).unwrap_or(0);
            if hits > best.map(|(_, h)| h).unwrap_or(0) {
                best = Some((id, hits));
            }
        }
        best.map(|(id, _)| id.to_string())
            .unwrap_or_else(|| SHARED_PLATFORM.to_string())
    }
}
