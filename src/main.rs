//! # Sextant CLI (`sextant`)
//!
//! The `sextant` binary ingests component source trees into a semantic index
//! and answers navigation and validation queries against it.
//!
//! ## Usage
//!
//! ```bash
//! sextant --config ./config/sextant.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sextant ingest` | Extract components, embed, and write the index |
//! | `sextant match "<query>"` | Components similar to a reference |
//! | `sextant project "<ref>"` | The reference expressed per platform |
//! | `sextant interpolate <a> <b>` | Step-wise blend of two components |
//! | `sextant explore --cool-warm 0.5` | Describe a point of the design space |
//! | `sextant position --terminal-organic -0.8` | Components nearest a position |
//! | `sextant anchors "<request>"` | Anchor activation |
//! | `sextant detect "<request>"` | Platform detection |
//! | `sextant drift "<request>" <platform>` | Drift from a platform identity |
//! | `sextant validate "<request>"` | Full validation report |
//! | `sextant component <id>` | One component |
//! | `sextant components` | Component list |
//! | `sextant design-space` | Design space definition |
//! | `sextant graph` | Component graph |
//! | `sextant stats` | Index summary |
//! | `sextant tools` | Registered tools |
//! | `sextant call <tool> '<json>'` | Dispatch a tool by name |
//!
//! Logs go to stderr, filtered by `SEXTANT_LOG` (default `warn`); `--verbose`
//! raises the level to `info`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use sextant::config;
use sextant::ingest;
use sextant::query;
use sextant::stats;
use sextant_core::models::PartialPosition;

/// Sextant — navigate a library of UI design components by meaning and by
/// position in the design space.
#[derive(Parser)]
#[command(
    name = "sextant",
    about = "Sextant — a semantic navigator for UI design components",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sextant.toml")]
    config: PathBuf,

    /// Log progress at info level.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Print full JSON responses instead of summaries.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Semantic position sliders. Omitted axes are 0.
#[derive(Args, Debug)]
struct PositionArgs {
    /// -1 terminal … +1 organic.
    #[arg(long, allow_hyphen_values = true)]
    terminal_organic: Option<f64>,

    /// -1 minimal … +1 dense.
    #[arg(long, allow_hyphen_values = true)]
    minimal_dense: Option<f64>,

    /// -1 cool … +1 warm.
    #[arg(long, allow_hyphen_values = true)]
    cool_warm: Option<f64>,

    /// -1 static … +1 animated.
    #[arg(long, allow_hyphen_values = true)]
    static_animated: Option<f64>,

    /// Maximum number of components to return.
    #[arg(long)]
    limit: Option<usize>,
}

impl PositionArgs {
    fn position(&self) -> anyhow::Result<PartialPosition> {
        for v in [
            self.terminal_organic,
            self.minimal_dense,
            self.cool_warm,
            self.static_animated,
        ]
        .into_iter()
        .flatten()
        {
            if !(-1.0..=1.0).contains(&v) {
                anyhow::bail!("axis values must be in [-1, 1], got {}", v);
            }
        }
        Ok(PartialPosition {
            terminal_organic: self.terminal_organic,
            minimal_dense: self.minimal_dense,
            cool_warm: self.cool_warm,
            static_animated: self.static_animated,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract components, build the graph, embed, and write the index.
    ///
    /// The run is all-or-nothing: on any error the previous index files are
    /// left untouched.
    Ingest {
        /// Extract and count only; no provider calls, nothing written.
        #[arg(long)]
        dry_run: bool,
    },

    /// Find components similar to a free-text reference.
    Match {
        query: String,

        /// Restrict to this platform plus shared components.
        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        limit: Option<usize>,

        /// Minimum similarity.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Project a reference into each platform's visual language.
    Project {
        reference: String,

        /// Target platforms in output order (repeatable); default all.
        #[arg(long = "platform")]
        platforms: Vec<String>,
    },

    /// Blend two components (by id or name) step by step.
    Interpolate {
        from: String,
        to: String,

        #[arg(long)]
        steps: Option<usize>,
    },

    /// Describe a point of the design space.
    Explore(PositionArgs),

    /// Components nearest a semantic position.
    Position(PositionArgs),

    /// Score brand anchors against a request.
    Anchors { request: String },

    /// Detect which platform a request belongs to.
    Detect { request: String },

    /// Measure drift of a request from a platform's identity.
    Drift { request: String, platform: String },

    /// Full validation: detection, anchors, drift, antipatterns, suggestions.
    Validate {
        request: String,

        /// Evaluate against this platform instead of the detected one.
        #[arg(long)]
        platform: Option<String>,
    },

    /// Show one component by id or name.
    Component { id: String },

    /// List components.
    Components {
        #[arg(long)]
        platform: Option<String>,
    },

    /// Print the design space definition (JSON).
    DesignSpace,

    /// Show the component relationship graph.
    Graph,

    /// Summarize the current index.
    Stats,

    /// List registered tools and their parameter schemas.
    Tools,

    /// Call a tool by name with JSON parameters.
    Call {
        tool: String,

        /// Parameters object, e.g. '{"query": "brass gauge"}'.
        #[arg(default_value = "{}")]
        params: String,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_env("SEXTANT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Tools = cli.command {
        return query::run_tools(cli.json);
    }

    let cfg = config::load_config(&cli.config)?;
    let json = cli.json;

    match cli.command {
        Commands::Ingest { dry_run } => {
            ingest::run_ingest(&cfg, dry_run).await?;
        }
        Commands::Match {
            query,
            platform,
            limit,
            threshold,
        } => {
            query::run_match(&cfg, &query, platform.as_deref(), limit, threshold, json).await?;
        }
        Commands::Project {
            reference,
            platforms,
        } => {
            query::run_project(&cfg, &reference, &platforms, json).await?;
        }
        Commands::Interpolate { from, to, steps } => {
            query::run_interpolate(&cfg, &from, &to, steps, json)?;
        }
        Commands::Explore(args) => {
            query::run_explore(&cfg, &args.position()?, args.limit, json)?;
        }
        Commands::Position(args) => {
            query::run_position(&cfg, &args.position()?, args.limit, json)?;
        }
        Commands::Anchors { request } => {
            query::run_anchors(&cfg, &request, json).await?;
        }
        Commands::Detect { request } => {
            query::run_detect(&cfg, &request, json).await?;
        }
        Commands::Drift { request, platform } => {
            query::run_drift(&cfg, &request, &platform, json).await?;
        }
        Commands::Validate { request, platform } => {
            query::run_validate(&cfg, &request, platform.as_deref(), json).await?;
        }
        Commands::Component { id } => {
            query::run_component(&cfg, &id, json)?;
        }
        Commands::Components { platform } => {
            query::run_components(&cfg, platform.as_deref(), json)?;
        }
        Commands::DesignSpace => {
            query::run_design_space(&cfg)?;
        }
        Commands::Graph => {
            query::run_graph(&cfg, json)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Call { tool, params } => {
            query::run_call(&cfg, &tool, &params).await?;
        }
        Commands::Tools => {}
    }

    Ok(())
}
