//! Audience Inspect: load a member population and rule segments from JSON
//! and answer membership questions against them.

use anyhow::Context;
use audience_core::{AudienceConfig, MissPolicy, Profile};
use audience_segmentation::{
    Audience, InMemoryStore, ListSegment, RuleDefinition, RuleSegment, Segmentable,
};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "audience-inspect")]
#[command(about = "Inspect segment membership over a member population")]
#[command(version)]
struct Cli {
    /// JSON array of profiles
    #[arg(short, long)]
    members: String,

    /// JSON array of rule segment definitions
    #[arg(short, long)]
    segments: Option<String>,

    /// Comma-separated names of empty list segments to register
    #[arg(long)]
    lists: Option<String>,

    /// Optional TOML config file (environment overrides with AUDIENCE__*)
    #[arg(long, env = "AUDIENCE_CONFIG")]
    config: Option<String>,

    /// Resolve unknown segment names to `none` instead of failing
    #[arg(long, default_value_t = false)]
    fallback_none: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered segment names
    List,

    /// Check whether a member belongs to a segment
    Check {
        /// Member id
        member: String,
        /// Segment name
        segment: String,
    },

    /// Show every segment a member belongs to
    Memberships {
        /// Member id
        member: String,
    },

    /// Print the members of a segment
    Members {
        /// Segment name
        segment: String,

        /// Print a random sample of this size instead
        #[arg(long)]
        sample: Option<usize>,
    },

    /// Add a member to the given segments, then print its memberships
    Add {
        /// Member id
        member: String,
        /// Segment names, applied in order
        #[arg(required = true)]
        segments: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.fallback_none {
        config.lookup_miss = MissPolicy::FallbackNone;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(InMemoryStore::with_members(load_profiles(&cli.members)?));
    info!(members = store.len(), "Member population loaded");

    let audience: Audience<Profile> = Audience::with_config(store.clone(), config);

    if let Some(path) = &cli.segments {
        for definition in load_rules(path)? {
            let criteria = definition.criteria;
            audience.register(&definition.name, move |ctx| {
                Ok(RuleSegment::new(criteria.clone(), ctx.store()))
            })?;
        }
    }
    if let Some(lists) = &cli.lists {
        for name in lists.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            audience.register(name, |_| Ok(ListSegment::<Profile>::new()))?;
        }
    }
    audience.seal();

    match cli.command {
        Commands::List => {
            for name in audience.segment_names() {
                println!("{name}");
            }
        }
        Commands::Check { member, segment } => {
            let profile = find_member(&store, &member)?;
            let included = profile.in_segment(&audience, &segment)?;
            println!("{}", serde_json::json!({ "member": member, "segment": segment, "included": included }));
        }
        Commands::Memberships { member } => {
            let profile = find_member(&store, &member)?;
            let names = profile.segment_names(&audience)?;
            println!("{}", serde_json::json!({ "member": member, "segments": names }));
        }
        Commands::Members { segment, sample } => {
            let segment = audience.segment(&segment)?;
            let members = match sample {
                Some(amount) => segment.sample(amount)?,
                None => segment.members()?.collect(),
            };
            println!("{}", serde_json::to_string_pretty(&members)?);
        }
        Commands::Add { member, segments } => {
            let profile = find_member(&store, &member)?;
            if let Err(e) = profile.add_to_segments(&audience, &segments) {
                warn!(member = %member, error = %e, "Stopped adding to segments");
                return Err(e.into());
            }
            let names = profile.segment_names(&audience)?;
            println!("{}", serde_json::json!({ "member": member, "segments": names }));
        }
    }

    Ok(())
}

/// An explicitly named config file must load. Without one, environment
/// problems fall back to defaults.
fn load_config(path: Option<&str>) -> anyhow::Result<AudienceConfig> {
    match path {
        Some(path) => AudienceConfig::load_from(Some(path))
            .with_context(|| format!("Failed to load config file {path}")),
        None => Ok(AudienceConfig::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {e}");
            AudienceConfig::default()
        })),
    }
}

fn load_profiles(path: &str) -> anyhow::Result<Vec<Profile>> {
    let raw = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read members file {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid members file {path}"))
}

fn load_rules(path: &str) -> anyhow::Result<Vec<RuleDefinition>> {
    let raw = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read segments file {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid segments file {path}"))
}

fn find_member(store: &InMemoryStore<Profile>, id: &str) -> anyhow::Result<Profile> {
    store
        .get(&id.to_string())
        .with_context(|| format!("Unknown member: {id}"))
}
