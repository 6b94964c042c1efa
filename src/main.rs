use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolaudit::extract::{extract_dispatch, extract_registry, unique_endpoint_paths};
use toolaudit::format;
use toolaudit::patch::{self, presets, Bump, ChangeStats, ManifestUpdate, ToolPatch, VersionChange};
use toolaudit::reconcile::{compare_docs, documented_endpoints, reconcile_source};
use toolaudit::smoke::{default_targets, targets_from_paths, SmokeRunner, UreqProbe};
use toolaudit::{Config, LogFormat};

#[derive(Parser)]
#[command(name = "toolaudit")]
#[command(about = "Audit, smoke-test and patch an MCP tool server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level filter (e.g. debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print reports as JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile declared tools with dispatch cases and documentation
    Analyze {
        /// Server source file (defaults to TOOLAUDIT_SOURCE_PATH)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Skip the documentation comparison
        #[arg(long)]
        no_docs: bool,
    },

    /// List declared tools with their parameters
    Tools {
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// List dispatch cases with endpoint, method and input handling
    Dispatch {
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Compare documented endpoints with routed endpoints
    CompareDocs {
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Probe the hosted API endpoints one by one
    Smoke {
        /// Probe the endpoint paths found in the source instead of the built-in catalog
        #[arg(long)]
        from_source: bool,
        #[arg(long)]
        source: Option<PathBuf>,
        /// API base URL (defaults to TOOLAUDIT_API_BASE)
        #[arg(long)]
        base_url: Option<String>,
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Delay between requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Insert tool declarations and dispatch cases into the server source
    PatchTools {
        #[arg(long)]
        source: Option<PathBuf>,
        /// Built-in patch to apply
        #[arg(long, value_enum, conflicts_with = "spec")]
        preset: Option<Preset>,
        /// JSON file describing the patch
        #[arg(long)]
        spec: Option<PathBuf>,
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Update version, description and keywords in the package manifest
    BumpManifest {
        /// Manifest path (defaults to TOOLAUDIT_MANIFEST_PATH)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Explicit new version
        #[arg(long = "set-version", conflicts_with = "bump")]
        set_version: Option<String>,
        /// Version component to increment
        #[arg(long, value_enum)]
        bump: Option<BumpArg>,
        #[arg(long)]
        description: Option<String>,
        /// Replacement keyword list (repeatable)
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    ExtendedBazi,
}

#[derive(Clone, Copy, ValueEnum)]
enum BumpArg {
    Major,
    Minor,
    Patch,
}

impl From<BumpArg> for Bump {
    fn from(arg: BumpArg) -> Self {
        match arg {
            BumpArg::Major => Bump::Major,
            BumpArg::Minor => Bump::Minor,
            BumpArg::Patch => Bump::Patch,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(&cli.log_level, config.log_format);

    match cli.command {
        Commands::Analyze { source, no_docs } => {
            let text = read_source(source.as_deref().unwrap_or(&config.source_path))?;
            let docs = documented_endpoints();
            let docs = (!no_docs).then_some(docs.as_slice());
            let report = reconcile_source(&text, docs);
            if cli.json {
                print!("{}", format::render_json(&report)?);
            } else {
                print!("{}", format::render_reconciliation(&report));
            }
        }
        Commands::Tools { source } => {
            let text = read_source(source.as_deref().unwrap_or(&config.source_path))?;
            match extract_registry(&text) {
                Ok(registry) if cli.json => print!("{}", format::render_json(&registry)?),
                Ok(registry) => print!("{}", format::render_tool_listing(&registry)),
                Err(e) if e.is_degraded() => println!("Cannot analyze source: {}", e),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Dispatch { source } => {
            let text = read_source(source.as_deref().unwrap_or(&config.source_path))?;
            match extract_dispatch(&text) {
                Ok(table) if cli.json => print!("{}", format::render_json(&table)?),
                Ok(table) => print!("{}", format::render_dispatch_listing(&table)),
                Err(e) if e.is_degraded() => println!("Cannot analyze source: {}", e),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::CompareDocs { source } => {
            let text = read_source(source.as_deref().unwrap_or(&config.source_path))?;
            match extract_dispatch(&text) {
                Ok(table) => {
                    let comparison = compare_docs(&documented_endpoints(), &table.cases);
                    if cli.json {
                        print!("{}", format::render_json(&comparison)?);
                    } else {
                        print!("{}", format::render_docs_comparison(&comparison));
                    }
                }
                Err(e) if e.is_degraded() => println!("Cannot analyze source: {}", e),
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Smoke {
            from_source,
            source,
            base_url,
            timeout_secs,
            delay_ms,
        } => {
            let targets = if from_source {
                let text = read_source(source.as_deref().unwrap_or(&config.source_path))?;
                targets_from_paths(&unique_endpoint_paths(&text))
            } else {
                default_targets()
            };

            if config.api_key.is_none() {
                tracing::warn!("TOOLAUDIT_API_KEY is not set, probing without authorization");
            }
            let timeout = match timeout_secs {
                Some(0) => anyhow::bail!("--timeout-secs must be at least 1"),
                Some(secs) => Duration::from_secs(secs),
                None => config.request_timeout,
            };
            let delay = delay_ms
                .map(Duration::from_millis)
                .unwrap_or(config.request_delay);
            let base_url = base_url.unwrap_or_else(|| config.api_base.clone());

            let probe = UreqProbe::new(timeout, config.api_key.as_deref());
            let report = SmokeRunner::new(&probe, &base_url, delay).run(&targets);
            if cli.json {
                print!("{}", format::render_json(&report)?);
            } else {
                print!("{}", format::render_smoke_summary(&report));
            }
        }
        Commands::PatchTools {
            source,
            preset,
            spec,
            dry_run,
        } => {
            let patch_spec = match (preset, spec) {
                (_, Some(path)) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read patch spec {}", path.display()))?;
                    serde_json::from_str::<ToolPatch>(&raw)
                        .with_context(|| format!("Invalid patch spec {}", path.display()))?
                }
                (Some(Preset::ExtendedBazi), None) => presets::extended_bazi(),
                (None, None) => anyhow::bail!("Either --preset or --spec is required"),
            };

            let path = source.unwrap_or_else(|| config.source_path.clone());
            let text = read_source(&path)?;
            let outcome = patch::add_tool_blocks(&text, &patch_spec);

            println!("Tools added:     {}", outcome.tools_added.join(", "));
            println!("Cases added:     {}", outcome.cases_added.join(", "));
            if !outcome.already_present.is_empty() {
                println!("Already present: {}", outcome.already_present.join(", "));
            }
            for anchor in &outcome.missing_anchors {
                println!("Anchor not found: {}", anchor);
            }

            if !outcome.changed() {
                println!("Nothing to change.");
            } else if dry_run {
                print_preview(&text, &outcome.text);
            } else {
                patch::write_file(&path, &outcome.text)?;
                println!("Updated {}", path.display());
            }
        }
        Commands::BumpManifest {
            manifest,
            set_version,
            bump,
            description,
            keywords,
            dry_run,
        } => {
            let version = match (set_version, bump) {
                (Some(version), _) => VersionChange::Set(version),
                (None, Some(bump)) => VersionChange::Bump(bump.into()),
                (None, None) => VersionChange::Bump(Bump::Patch),
            };
            let update = ManifestUpdate {
                version,
                description,
                keywords: (!keywords.is_empty()).then_some(keywords),
            };

            let path = manifest.unwrap_or_else(|| config.manifest_path.clone());
            let text = read_source(&path)?;
            let outcome = patch::update_manifest(&text, &update)?;

            println!(
                "Version: {} -> {}",
                outcome.previous_version.as_deref().unwrap_or("(none)"),
                outcome.new_version
            );
            if dry_run {
                print_preview(&text, &outcome.text);
            } else {
                patch::write_file(&path, &outcome.text)?;
                println!("Updated {}", path.display());
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so reports on stdout stay machine-readable.
fn init_tracing(log_level: &str, log_format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("toolaudit={}", log_level).into());

    match log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "Loaded input");
    Ok(text)
}

fn print_preview(before: &str, after: &str) {
    let stats = ChangeStats::between(before, after);
    println!(
        "Dry run: {} -> {} lines ({:+}), nothing written",
        stats.lines_before,
        stats.lines_after,
        stats.lines_added()
    );
    println!();
    print!("{}", after);
}
