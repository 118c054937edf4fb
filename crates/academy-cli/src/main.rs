//! academy - resolve and preview announcement/SMS audiences.
//!
//! Decodes `target_audience` values, resolves them against a directory
//! snapshot (live, cached or from a file), and submits outbound messages.

mod args;

use std::io;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use academy_core::api::ApiClient;
use academy_core::cache::SnapshotCache;
use academy_core::config::{Config, ENV_LOG_DIR};
use academy_core::directory::{DirectoryLoader, DirectoryPayload, DirectoryTree, SnapshotSource};
use academy_core::models::{Channel, Locale, OutboundMessage};
use academy_core::utils::truncate_string;
use academy_core::{
    decode_target_audience, encode_target_audience, resolve_with_report, summarize, AudienceSelection,
    Directory,
};

use args::{read_value, Options};

/// Log file name prefix inside `ACADEMY_LOG_DIR`
const LOG_FILE_PREFIX: &str = "academy.log";

const USAGE: &str = "\
Usage: academy <command> [options]

Commands:
  decode <json|@file>        Print the canonical target_audience
  resolve --selection <json|@file> [--directory @file] [--offline] [--search q]
                             Print the resolved account ids
  summary --selection <json|@file> [--directory @file] [--offline] [--locale en|ar]
                             Print the audience label and counts
  send --channel announcement|sms --title <text> --body <text|@file> --selection <json|@file>
                             Submit an outbound message

Environment: ACADEMY_API_URL, ACADEMY_API_TOKEN, ACADEMY_BRANCH_ID,
ACADEMY_LOCALE, ACADEMY_LOG_DIR, RUST_LOG";

/// Initialize the tracing subscriber for logging. The returned guard
/// flushes the log file on drop and must live until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    let opts = Options::parse(rest)?;
    debug!(command = %command, "Running command");

    match command.as_str() {
        "decode" => decode(&opts),
        "resolve" => resolve(&opts).await,
        "summary" => summary(&opts).await,
        "send" => send(&opts).await,
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Parse a selection given as JSON, or as a bare legacy word like `parents`.
fn parse_selection(raw: &str) -> Result<AudienceSelection> {
    let value = serde_json::from_str(raw.trim())
        .unwrap_or_else(|_| serde_json::Value::String(raw.trim().to_string()));
    decode_target_audience(value).context("Invalid target audience")
}

fn selection_arg(opts: &Options) -> Result<AudienceSelection> {
    let raw = opts
        .selection
        .as_deref()
        .ok_or_else(|| anyhow!("--selection is required"))?;
    parse_selection(&read_value(raw)?)
}

fn locale(opts: &Options, config: &Config) -> Result<Locale> {
    match opts.locale.as_deref() {
        Some(code) => Locale::from_code(code).ok_or_else(|| anyhow!("Unknown locale: {}", code)),
        None => Ok(config.locale),
    }
}

/// Directory file: either a cached payload or a bare tree response.
fn directory_from_file(raw: &str) -> Result<Directory> {
    let contents = read_value(raw)?;
    if let Ok(payload) = serde_json::from_str::<DirectoryPayload>(&contents) {
        return Ok(Directory::from_payload(&payload));
    }
    let tree: DirectoryTree = serde_json::from_str(&contents).context("Failed to parse directory file")?;
    Ok(Directory::from_tree(&tree))
}

fn api_client(config: &Config) -> Result<ApiClient> {
    let mut client = ApiClient::new(config.api_url())?;
    if let Some(token) = &config.api_token {
        client.set_token(token.clone());
    }
    Ok(client)
}

fn directory_loader(config: &Config) -> Result<DirectoryLoader> {
    let cache = SnapshotCache::new(config.cache_dir()?)?;
    Ok(DirectoryLoader::new(api_client(config)?, config.scope()).with_cache(cache))
}

async fn load_directory(opts: &Options, config: &Config) -> Result<Directory> {
    if let Some(raw) = &opts.directory {
        return directory_from_file(raw);
    }

    let loader = directory_loader(config)?;
    let loaded = if opts.offline {
        loader
            .load_cached()?
            .ok_or_else(|| anyhow!("No cached directory for {:?}; run once without --offline", loader.scope()))?
    } else {
        loader.load().await?
    };
    if let SnapshotSource::Cached(age) = &loaded.source {
        eprintln!("Using cached directory ({})", age);
    }
    Ok(loaded.directory)
}

// ============================================================================
// Commands
// ============================================================================

fn decode(opts: &Options) -> Result<()> {
    let raw = opts
        .positional
        .first()
        .ok_or_else(|| anyhow!("decode needs a target_audience value"))?;
    let selection = parse_selection(&read_value(raw)?)?;
    println!("{}", serde_json::to_string_pretty(&encode_target_audience(&selection))?);
    Ok(())
}

async fn resolve(opts: &Options) -> Result<()> {
    let selection = selection_arg(opts)?;
    let config = Config::load()?;
    let directory = load_directory(opts, &config).await?;

    if let Some(query) = &opts.search {
        let view = directory.search(query);
        eprintln!("{} of {} people match {:?}", view.len(), directory.len(), view.query());

        // Server-side matches are listed for reference only; resolution below
        // always uses the full snapshot.
        if opts.directory.is_none() && !opts.offline {
            match directory_loader(&config)?.search(query).await {
                Ok(Some(results)) => eprintln!("server search: {} matches for {:?}", results.len(), results.query()),
                Ok(None) => debug!(query = %query, "Server search superseded"),
                Err(e) => warn!(error = %e, "Server search failed"),
            }
        }
    }

    let (audience, report) = resolve_with_report(&selection, &directory);
    println!("{}", serde_json::to_string_pretty(&audience)?);

    for dropped in &report.dropped {
        match &dropped.branch {
            Some(branch) => eprintln!("dropped {} in branch {} ({:?})", dropped.id, branch, dropped.reason),
            None => eprintln!("dropped {} ({:?})", dropped.id, dropped.reason),
        }
    }
    for player in &report.unreachable_players {
        eprintln!("player {} has no parent or own account", player);
    }
    info!(accounts = audience.len(), "Resolve finished");
    Ok(())
}

async fn summary(opts: &Options) -> Result<()> {
    let selection = selection_arg(opts)?;
    let config = Config::load()?;
    let locale = locale(opts, &config)?;
    let directory = load_directory(opts, &config).await?;

    let summary = summarize(&selection, &directory, locale);
    println!("{}", summary.label);
    for entry in &summary.role_breakdown {
        println!("  {}: {}", entry.role.display_name(locale), entry.count);
    }
    if summary.branch_count > 0 {
        println!("  branches: {}", summary.branch_count);
    }
    Ok(())
}

async fn send(opts: &Options) -> Result<()> {
    let channel_name = opts.channel.as_deref().unwrap_or("announcement");
    let channel = Channel::from_name(channel_name).ok_or_else(|| anyhow!("Unknown channel: {}", channel_name))?;
    let title = opts.title.as_deref().map(str::trim).unwrap_or_default();
    let body = match &opts.body {
        Some(raw) => read_value(raw)?,
        None => String::new(),
    };
    if title.is_empty() || body.trim().is_empty() {
        bail!("--title and --body are required");
    }

    let selection = selection_arg(opts)?;
    if selection.is_blank() {
        bail!("The selected audience is empty");
    }

    let config = Config::load()?;
    let locale = locale(opts, &config)?;
    let directory = load_directory(opts, &config).await?;
    let summary = summarize(&selection, &directory, locale);
    if summary.is_empty() {
        bail!("The selected audience resolves to no recipients");
    }

    let message = OutboundMessage::new(channel, title, body.trim(), selection);
    let receipt = api_client(&config)?
        .submit_message(&message)
        .await
        .with_context(|| format!("Failed to submit {}", channel))?;

    info!(
        channel = %channel,
        title = %truncate_string(title, 40),
        recipients = summary.count,
        "Message submitted"
    );
    println!("Submitted {} \"{}\" to {}", channel, truncate_string(title, 60), summary.label);
    if let Some(id) = receipt.id {
        println!("id: {}", id);
    }
    if let Some(message) = receipt.message {
        println!("{}", message);
    }
    Ok(())
}
