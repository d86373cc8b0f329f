//! Command-line interface for storyfetch.
//!
//! Provides commands for classifying share links, extracting their
//! identifiers, fetching media metadata and inspecting remote flags.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{
    FileKeyValueStore, HttpTransport, KeyValueStore, MemoryKeyValueStore, ReqwestTransport,
};
use crate::config::{self, ResolvedConfig};
use crate::core::{classify, extract_identifier, Extractor, FetchClient, FlagResolver, RefreshOutcome};

/// storyfetch - Resolve story share links and fetch their media
#[derive(Parser, Debug)]
#[command(name = "storyfetch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a share link as story or highlight
    Classify {
        /// Share link
        url: String,
    },

    /// Extract the content identifier from a share link
    Id {
        /// Share link
        url: String,
    },

    /// Resolve a share link and fetch its media metadata
    Fetch {
        /// Share link
        url: String,

        /// Print the full extraction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved feature flags
    Flags {
        /// App version to evaluate visibility for (defaults to configured version)
        #[arg(long)]
        app_version: Option<String>,

        /// Fetch fresh values before printing
        #[arg(long)]
        refresh: bool,

        /// Ignore and do not write the local cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Classify { url } => {
                println!("{}", classify(&url));
                Ok(())
            }
            Commands::Id { url } => {
                let id = extract_identifier(&url).with_context(|| format!("'{}'", url))?;
                println!("{}", id);
                Ok(())
            }
            Commands::Fetch { url, json } => cmd_fetch(&url, json).await,
            Commands::Flags {
                app_version,
                refresh,
                no_cache,
            } => cmd_flags(app_version, refresh, no_cache).await,
            Commands::Config => cmd_config(),
        }
    }
}

fn fetch_client(config: &ResolvedConfig) -> Result<FetchClient> {
    let transport: Arc<dyn HttpTransport> =
        Arc::new(ReqwestTransport::new().context("Failed to create HTTP client")?);
    Ok(FetchClient::new(transport, config.fetch.clone()))
}

async fn cmd_fetch(url: &str, json: bool) -> Result<()> {
    let config = config::config()?;
    let extractor = Extractor::new(fetch_client(config)?, config.extract_url.clone());

    let extraction = extractor
        .extract(url)
        .await
        .with_context(|| format!("Failed to fetch '{}'", url))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    let media = &extraction.media;
    println!("Kind:       {}", extraction.kind);
    println!("Identifier: {}", extraction.identifier);
    println!("Title:      {}", media.video_title);
    println!(
        "Quality:    {}x{}",
        media.video_quality.width, media.video_quality.height
    );
    println!("Versions:   {}", media.all_video_versions.len());
    println!("Thumbnail:  {}", media.thumbnail_url);
    println!("Download:   {}", media.best_url());

    Ok(())
}

async fn cmd_flags(app_version: Option<String>, refresh: bool, no_cache: bool) -> Result<()> {
    let config = config::config()?;

    let store: Arc<dyn KeyValueStore> = if no_cache {
        Arc::new(MemoryKeyValueStore::new())
    } else {
        Arc::new(
            FileKeyValueStore::open(config.settings_dir())
                .with_context(|| format!("Failed to open {}", config.settings_dir().display()))?,
        )
    };

    let resolver = FlagResolver::load(fetch_client(config)?, store, config.flag_resolver_config());

    if refresh {
        let (flags, subscription) = resolver.reload().await;
        if flags == RefreshOutcome::Retained || subscription == RefreshOutcome::Retained {
            eprintln!("Warning: refresh failed, showing cached values (see logs)");
        }
    }

    let version = app_version.unwrap_or_else(|| config.app_version.clone());
    let flags = resolver.flags();
    let offer = resolver.subscription();

    println!("Flags:");
    println!("  primary:          {}", flags.primary);
    println!("  legacy_override:  {}", flags.legacy_override);
    println!("  override_v1:      {} ({})", flags.override_v1, config.gates.v1);
    println!("  override_v2:      {} ({})", flags.override_v2, config.gates.v2);
    println!(
        "  config_version:   {}",
        flags.config_version.as_deref().unwrap_or("(none)")
    );
    match flags.fetched_at {
        Some(at) => println!("  fetched_at:       {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  fetched_at:       (never)"),
    }
    println!();
    println!(
        "Download visible for {}: {}",
        version,
        resolver.is_download_visible(&version)
    );
    println!();
    println!("Subscription offer:");
    println!("  offering_id:      {}", offer.offering_id);
    if let Some(ref fallback) = offer.fallback_offering_id {
        println!("  fallback:         {}", fallback);
    }
    println!(
        "  packages:         annual={} monthly={} weekly={}",
        offer.show_annual, offer.show_monthly, offer.show_weekly
    );
    println!("  preferred:        {}", offer.preferred_package);

    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = config::config()?;

    println!("storyfetch configuration:");
    println!();
    match config.config_file {
        Some(ref path) => println!("Config file:      {}", path.display()),
        None => println!("Config file:      (none, using defaults)"),
    }
    println!("Home:             {}", config.home.display());
    println!("Settings:         {}", config.settings_dir().display());
    println!();
    println!("Extract URL:      {}", config.extract_url);
    println!("Flags URL:        {}", config.flags_url);
    println!("Subscription URL: {}", config.subscription_url);
    println!();
    println!("Timeout:          {:?}", config.fetch.timeout);
    println!("Max retries:      {}", config.fetch.retry.max_retries);
    println!(
        "Backoff:          {}^n x {}ms",
        config.fetch.retry.backoff_base, config.fetch.retry.backoff_unit_ms
    );
    println!();
    println!("App version:      {}", config.app_version);
    println!("Gated versions:   {} / {}", config.gates.v1, config.gates.v2);

    Ok(())
}
