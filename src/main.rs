use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use xtream_probe_lib::config::ProbeConfig;
use xtream_probe_lib::{report, run_batch};

/// Checks Xtream Codes lines pasted as URLs or Host/User/Pass text.
///
/// TLS certificate verification is DISABLED for every panel request, since most
/// panels run self-signed or mismatched certificates. Do not point this at hosts
/// whose identity you need to trust.
#[derive(clap::Parser, Debug)]
#[command(version, about, long_about)]
struct Args {
    /// Pasted text containing panel URLs or labelled credentials
    text: Option<String>,

    /// Read the text from a file ("-" for stdin)
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Read the text from the system clipboard
    #[arg(long, conflicts_with_all = ["text", "file"])]
    clipboard: bool,

    /// Search live, movie and series names (case and accent insensitive)
    #[arg(short, long)]
    search: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra attempts per request
    #[arg(long)]
    retries: Option<u32>,

    /// Accounts probed at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    #[arg(long)]
    user_agent: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    let default_filter = if args.verbose {
        "xtream_probe_lib=debug,xtream_probe=debug"
    } else {
        "xtream_probe_lib=warn,xtream_probe=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => ProbeConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ProbeConfig::load().context("failed to load config")?,
    };
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrent_accounts = concurrency;
    }
    if let Some(ua) = &args.user_agent {
        config.user_agent = ua.clone();
    }
    let config = config.validate();

    let text = read_input(&args)?;
    let results = run_batch(&text, args.search.as_deref(), &config).await;
    if results.is_empty() {
        eprintln!("⚠️ No credentials found. Paste a get.php / player_api.php URL or Host/User/Pass lines.");
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", report::render_text(&results, &config));
    }
    Ok(())
}

fn read_input(args: &Args) -> Result<String, anyhow::Error> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if args.clipboard {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        return clipboard.get_text().context("clipboard holds no text");
    }
    match &args.file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}
