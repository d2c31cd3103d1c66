// # zonesyncd - zonesync command-line runner
//
// Thin integration layer: reads configuration from the environment, builds
// the provider through the registry and runs a single pass of the sync
// engine. All reconciliation logic lives in zonesync-core.
//
// Logs go to stderr; stdout carries JSON output only.
//
// ## Configuration
//
// ### Provider
// - `ZONESYNC_PROVIDER_TYPE`: Provider type (desec)
// - `DESEC_API_TOKEN`: deSEC API token (required)
// - `DESEC_API_URL`: API base URL override
// - `ZONESYNC_HTTP_TIMEOUT_SECS`: Per-request timeout, 1..=300
//
// ### Zones and records
// - `ZONESYNC_DOMAIN_FILTER`: Comma-separated zone roots to manage
// - `ZONESYNC_EXCLUDE_DOMAINS`: Comma-separated names never to manage
// - `ZONESYNC_SUPPORTED_TYPES`: Comma-separated record types to report
// - `ZONESYNC_COLLAPSE_DUPLICATES`: Keep one RRSet per (subname, type)
//
// ### Pass
// - `ZONESYNC_DRY_RUN`: Plan and log writes without submitting them
// - `ZONESYNC_PASS_TIMEOUT_SECS`: Deadline for the whole pass, 1..=3600
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export DESEC_API_TOKEN=your_token
// export ZONESYNC_DOMAIN_FILTER=example.com
//
// zonesyncd zones
// zonesyncd records
// echo '{"create":[{"dnsName":"www.example.com","recordType":"A","targets":["1.2.3.4"]}]}' \
//     | zonesyncd apply -
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::config::DEFAULT_HTTP_TIMEOUT_SECS;
use zonesync_core::{
    Changes, DomainFilter, ProviderConfig, ProviderRegistry, RequestContext, SupportedTypes,
    SyncConfig, SyncEngine, SyncEvent,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_PASS_TIMEOUT_SECS: u64 = 60;

/// Exit codes for the runner
///
/// - 0: Pass completed
/// - 1: Configuration or startup error
/// - 2: Runtime error (provider failure, deadline, cancellation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Debug, Parser)]
#[command(name = "zonesyncd", version, about = "Reconcile DNS changes into deSEC zones")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the managed zones as JSON
    Zones,

    /// Print every supported record in the managed zones as JSON
    Records,

    /// Apply a change document and print the pass report as JSON
    Apply {
        /// Path to a JSON change document, or `-` for stdin
        changes: String,
    },
}

/// Runner configuration
///
/// No `Debug` derive: the API token must never be printed.
struct Config {
    provider_type: String,
    api_token: String,
    api_url: Option<String>,
    domain_filter: Vec<String>,
    exclude_domains: Vec<String>,
    dry_run: bool,
    http_timeout_secs: u64,
    pass_timeout_secs: u64,
    collapse_duplicates: bool,
    supported_types: Option<Vec<String>>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string());

        Ok(Self {
            provider_type: var("ZONESYNC_PROVIDER_TYPE")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "desec".to_string()),
            api_token: var("DESEC_API_TOKEN").unwrap_or_default(),
            api_url: var("DESEC_API_URL").filter(|s| !s.is_empty()),
            domain_filter: split_list(var("ZONESYNC_DOMAIN_FILTER")),
            exclude_domains: split_list(var("ZONESYNC_EXCLUDE_DOMAINS")),
            dry_run: parse_flag("ZONESYNC_DRY_RUN", var("ZONESYNC_DRY_RUN"))?,
            http_timeout_secs: parse_secs(
                "ZONESYNC_HTTP_TIMEOUT_SECS",
                var("ZONESYNC_HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            pass_timeout_secs: parse_secs(
                "ZONESYNC_PASS_TIMEOUT_SECS",
                var("ZONESYNC_PASS_TIMEOUT_SECS"),
                DEFAULT_PASS_TIMEOUT_SECS,
            )?,
            collapse_duplicates: parse_flag(
                "ZONESYNC_COLLAPSE_DUPLICATES",
                var("ZONESYNC_COLLAPSE_DUPLICATES"),
            )?,
            supported_types: var("ZONESYNC_SUPPORTED_TYPES")
                .map(|v| split_list(Some(v)))
                .filter(|types| !types.is_empty()),
            log_level: var("ZONESYNC_LOG_LEVEL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            anyhow::bail!(
                "DESEC_API_TOKEN is required. \
                Set it via: export DESEC_API_TOKEN=your_token"
            );
        }

        if let Some(ref url) = self.api_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!("DESEC_API_URL must use HTTP or HTTPS scheme. Got: {}", url);
        }

        if !(1..=300).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "ZONESYNC_HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        if !(1..=3600).contains(&self.pass_timeout_secs) {
            anyhow::bail!(
                "ZONESYNC_PASS_TIMEOUT_SECS must be between 1 and 3600 seconds. Got: {}",
                self.pass_timeout_secs
            );
        }

        for domain in self.domain_filter.iter().chain(&self.exclude_domains) {
            validate_domain_name(domain.trim_start_matches('.'))?;
        }

        if let Some(ref types) = self.supported_types {
            for t in types {
                if !t.chars().all(|c| c.is_ascii_alphanumeric()) {
                    anyhow::bail!("ZONESYNC_SUPPORTED_TYPES contains an invalid type: '{}'", t);
                }
            }
        }

        self.level()?;

        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    fn provider_config(&self) -> ProviderConfig {
        match self.provider_type.as_str() {
            "desec" => ProviderConfig::Desec {
                api_token: self.api_token.clone(),
                base_url: self.api_url.clone(),
                timeout_secs: Some(self.http_timeout_secs),
            },
            other => ProviderConfig::Custom {
                factory: other.to_string(),
                config: serde_json::json!({
                    "base_url": self.api_url,
                    "timeout_secs": self.http_timeout_secs,
                }),
            },
        }
    }

    fn sync_config(&self) -> SyncConfig {
        let filter =
            DomainFilter::new(&self.domain_filter).with_exclusions(&self.exclude_domains);

        let mut config = SyncConfig::new()
            .with_domain_filter(filter)
            .with_dry_run(self.dry_run)
            .with_collapse_duplicates(self.collapse_duplicates);
        if let Some(ref types) = self.supported_types {
            config.supported_types = SupportedTypes::new(types);
        }
        config
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("") => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => anyhow::bail!("{} must be true or false. Got: {}", name, other),
    }
}

fn parse_secs(name: &str, value: Option<String>, default: u64) -> Result<u64> {
    match value.filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s
            .parse()
            .with_context(|| format!("{} must be a number of seconds. Got: {}", name, s)),
    }
}

/// Basic RFC 1035 shape check for configured zone roots
fn validate_domain_name(domain: &str) -> Result<()> {
    let domain = domain.trim_end_matches('.');
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }
        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            anyhow::bail!("Domain label contains invalid characters. Label: '{}'", label);
        }
    }

    Ok(())
}

/// Read a change document from a file, or stdin for `-`
fn read_changes(source: &str) -> Result<Changes> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read changes from stdin")?;
        buf
    } else {
        let path = PathBuf::from(source);
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read changes file {}", path.display()))?
    };

    serde_json::from_str(&text).with_context(|| format!("Invalid change document in {}", source))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    // Parse the change document before touching the network
    let changes = match &cli.command {
        Command::Apply { changes } => match read_changes(changes) {
            Ok(c) => Some(c),
            Err(e) => {
                error!("{:#}", e);
                return ZonesyncExitCode::ConfigError.into();
            }
        },
        _ => None,
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let engine = match build_engine(&config) {
            Ok(engine) => engine,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return ZonesyncExitCode::ConfigError;
            }
        };

        let cancel = CancellationToken::new();
        let ctx = RequestContext::with_timeout(Duration::from_secs(config.pass_timeout_secs))
            .with_cancellation(cancel.clone());
        tokio::spawn(cancel_on_shutdown(cancel));

        match run_command(&engine, &ctx, &cli.command, changes).await {
            Ok(output) => {
                println!("{}", output);
                ZonesyncExitCode::Success
            }
            Err(e) => {
                error!("Pass failed: {:#}", e);
                ZonesyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

fn build_engine(config: &Config) -> Result<SyncEngine> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "desec")]
    {
        debug!("Registering deSEC provider");
        zonesync_provider_desec::register(&registry);
    }

    let api = registry.create_provider(&config.provider_config())?;
    info!("Using provider {}", api.provider_name());

    let (engine, mut events) = SyncEngine::new(api, config.sync_config())?;
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    Ok(engine)
}

async fn run_command(
    engine: &SyncEngine,
    ctx: &RequestContext,
    command: &Command,
    changes: Option<Changes>,
) -> Result<String> {
    let output = match command {
        Command::Zones => serde_json::to_string_pretty(&engine.managed_zones(ctx).await?)?,
        Command::Records => serde_json::to_string_pretty(&engine.records(ctx).await?)?,
        Command::Apply { .. } => {
            let changes = changes.unwrap_or_default();
            let report = engine.apply_changes(ctx, &changes).await?;
            info!(
                "Pass complete: {} zone(s), {} rrset(s), {} skipped{}",
                report.zones.len(),
                report.rrsets,
                report.skipped.len(),
                if report.dry_run { " (dry run)" } else { "" }
            );
            serde_json::to_string_pretty(&report)?
        }
    };
    Ok(output)
}

fn log_event(event: &SyncEvent) {
    match event {
        SyncEvent::ZoneWriteFailed { zone, error } => {
            warn!("Write to zone {} failed: {}", zone, error)
        }
        SyncEvent::ChangeSkipped(skipped) => debug!(
            "Skipped {} {} {}: no managed zone",
            skipped.kind, skipped.dns_name, skipped.record_type
        ),
        other => debug!("Sync event: {:?}", other),
    }
}

/// Cancel the pass on SIGTERM or SIGINT
#[cfg(unix)]
async fn cancel_on_shutdown(cancel: CancellationToken) {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Failed to install signal handlers: {}", e);
            return;
        }
    };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    warn!("Received {}, cancelling pass", received);
    cancel.cancel();
}

#[cfg(not(unix))]
async fn cancel_on_shutdown(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received CTRL-C, cancelling pass");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to wait for CTRL-C: {}", e),
    }
}
