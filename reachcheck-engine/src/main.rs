//! reachcheck - Cross-provider listing diagnostic CLI
//!
//! Searches for a business across map providers, runs the reconciliation
//! pipeline, and prints the resulting diagnostic report (plus an advisory
//! narrative when an annotator is configured).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reachcheck_common::config::Config;
use reachcheck_common::types::{BusinessIdentity, Provider};
use reachcheck_engine::annotator::Annotator;
use reachcheck_engine::providers::{GoogleAdapter, KakaoAdapter, NaverAdapter, ProviderAdapter};
use reachcheck_engine::snapshot::SnapshotStore;
use reachcheck_engine::Pipeline;

/// Command-line arguments for reachcheck
#[derive(Parser, Debug)]
#[command(name = "reachcheck")]
#[command(about = "Shows how consistently a business appears across map providers")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "REACHCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Snapshot output directory
    #[arg(long, env = "REACHCHECK_SNAPSHOT_DIR")]
    snapshot_dir: Option<PathBuf>,

    /// Collection deadline in seconds
    #[arg(long, env = "REACHCHECK_DEADLINE_SECS")]
    deadline_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for candidate businesses to diagnose
    Search {
        query: String,

        /// Provider to search with (google or kakao)
        #[arg(long, default_value = "kakao")]
        provider: String,
    },
    /// Collect, compare, and print a diagnostic report
    Report {
        /// Provider-issued place id
        #[arg(long)]
        place_id: Option<String>,

        /// Provider that issued --place-id
        #[arg(long, default_value = "google")]
        provider: String,

        /// Business name (search hint, required without --place-id)
        #[arg(long)]
        name: Option<String>,

        /// Address to narrow a name search
        #[arg(long)]
        address: Option<String>,

        #[arg(long, requires = "lng")]
        lat: Option<f64>,

        #[arg(long, requires = "lat")]
        lng: Option<f64>,

        /// Skip the advisory narrative even when an annotator is configured
        #[arg(long)]
        no_annotate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reachcheck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.snapshot_dir {
        config.snapshot_dir = Some(dir);
    }
    if let Some(secs) = cli.deadline_secs {
        config.collect_deadline_secs = Some(secs);
    }

    match cli.command {
        Command::Search { query, provider } => search(&config, &query, &provider).await,
        Command::Report { place_id, provider, name, address, lat, lng, no_annotate } => {
            let identity = build_identity(place_id, &provider, name, address, lat, lng)?;
            report(&config, &identity, no_annotate).await
        }
    }
}

async fn search(config: &Config, query: &str, provider: &str) -> Result<()> {
    let candidates = match provider.parse::<Provider>()? {
        Provider::Google => {
            let credentials =
                config.google.as_ref().context("Google credentials are not configured")?;
            GoogleAdapter::new(credentials)?.search(query, None).await?
        }
        Provider::Kakao => {
            let credentials =
                config.kakao.as_ref().context("Kakao credentials are not configured")?;
            KakaoAdapter::new(credentials)?.search(query).await?
        }
        Provider::Naver => bail!("Naver exposes no candidate picker; use google or kakao"),
    };

    if candidates.is_empty() {
        println!("No candidates found for '{}'", query);
        return Ok(());
    }
    for candidate in candidates {
        println!(
            "{}\t{}\t{}\t{}",
            candidate.provider,
            candidate.place_id.as_deref().unwrap_or("-"),
            candidate.name,
            candidate.address
        );
    }
    Ok(())
}

fn build_identity(
    place_id: Option<String>,
    provider: &str,
    name: Option<String>,
    address: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<BusinessIdentity> {
    let identity = if let Some(place_id) = place_id {
        BusinessIdentity::ByPlaceId { provider: provider.parse()?, place_id, name }
    } else if let (Some(lat), Some(lng), Some(name)) = (lat, lng, name.clone()) {
        BusinessIdentity::ByCoordinates { lat, lng, name }
    } else if let Some(name) = name {
        BusinessIdentity::ByNameAddress { name, address }
    } else {
        bail!("either --place-id or --name is required");
    };
    identity.validate()?;
    Ok(identity)
}

async fn report(config: &Config, identity: &BusinessIdentity, no_annotate: bool) -> Result<()> {
    let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
    if let Some(credentials) = &config.google {
        adapters.push(Arc::new(GoogleAdapter::new(credentials)?));
    }
    if let Some(credentials) = &config.naver {
        adapters.push(Arc::new(NaverAdapter::new(credentials)?));
    }
    if let Some(credentials) = &config.kakao {
        adapters.push(Arc::new(KakaoAdapter::new(credentials)?));
    }
    if adapters.is_empty() {
        bail!("no provider credentials configured; set up at least one of google/naver/kakao");
    }
    for provider in Provider::ALL {
        if !adapters.iter().any(|a| a.provider() == provider) {
            warn!(%provider, "Provider not configured; its evidence will be missing");
        }
    }

    let store = SnapshotStore::new(config.snapshot_dir())?;
    info!(snapshot_dir = %store.dir().display(), "Snapshot store ready");

    let pipeline = Pipeline::new(adapters, store, config.collect_deadline());
    let diagnostic = pipeline.run(identity).await?;

    println!("{}", serde_json::to_string_pretty(&diagnostic)?);

    if no_annotate {
        return Ok(());
    }
    if let Some(annotator_config) = &config.annotator {
        let annotator = Annotator::new(annotator_config)?;
        match annotator.annotate(&diagnostic).await {
            Ok(annotated) => {
                println!("\n--- advisory narrative ---\n{}", annotated.narrative);
            }
            // Narrative is advisory; its failure never degrades the report.
            Err(err) => warn!(error = %err, "Annotation failed; report stands on its own"),
        }
    }
    Ok(())
}
