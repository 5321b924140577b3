//! ipagrab: binary entrypoint.
//! Parses the command line, loads config, and drives history queries, search and downloads.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ipagrab::acquire::{AcquireRequest, Acquirer};
use ipagrab::config::AppConfig;
use ipagrab::search::{search_apps, AppSummary, DEFAULT_COUNTRY, DEFAULT_LIMIT};
use ipagrab::select::{has_version_id, select_version};
use ipagrab::store::ItunesStore;
use ipagrab::{resolve_app_id, AggregatedHistory, HistoryQuery};

#[derive(Parser, Debug)]
#[command(name = "ipagrab", version, about = "App Store version history and package downloads")]
struct Cli {
    /// Config file (defaults to $IPAGRAB_CONFIG, then config/ipagrab.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the version history of an app id or storefront URL
    History { input: String },
    /// Search the catalog, pick an app, then download it
    Search {
        term: String,
        #[arg(short = 'c', long, default_value = DEFAULT_COUNTRY)]
        country: String,
        #[arg(short = 'l', long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Query history, pick a version, then purchase (if needed) and download
    Get {
        input: String,
        #[arg(long)]
        version_id: Option<String>,
        /// Take the latest version without prompting
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; harmless when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    ipagrab::logging::init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = match &cli.config {
        Some(p) => AppConfig::load_from_file(p)?,
        None => AppConfig::load_default()?,
    };
    let client = ipagrab::http::build_client(&cfg)?;

    match cli.command {
        Commands::History { input } => {
            let query = HistoryQuery::from_config(&cfg, &client);
            let Some(res) = query.run(&input).await else {
                eprintln!("Could not find an app id in {input:?} (expected digits or an App Store URL)");
                return Ok(ExitCode::from(2));
            };
            print_history(&res.history);
            if let Some(p) = res.report_path {
                println!("\nReport saved to {}", p.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Search {
            term,
            country,
            limit,
        } => {
            let country = country.to_ascii_uppercase();
            println!("Searching for {term:?} in {country}");
            let apps = search_apps(&client, &cfg.store.search_url, &term, &country, limit).await?;
            if apps.is_empty() {
                println!("No apps found for {term:?} ({country})");
                return Ok(ExitCode::SUCCESS);
            }
            print_apps(&apps);
            let answer = prompt("Pick a number, or type an app id / URL (blank to quit):")?;
            let Some(app) = pick_app(&apps, &answer) else {
                return Ok(ExitCode::SUCCESS);
            };
            println!("Selected {} | {}", app.id, app.name);
            get(&cfg, &client, &app.id, None, false).await
        }
        Commands::Get {
            input,
            version_id,
            yes,
        } => get(&cfg, &client, &input, version_id, yes).await,
    }
}

async fn get(
    cfg: &AppConfig,
    client: &reqwest::Client,
    input: &str,
    version_id: Option<String>,
    yes: bool,
) -> Result<ExitCode> {
    let query = HistoryQuery::from_config(cfg, client);
    let Some(res) = query.run(input).await else {
        eprintln!("Could not find an app id in {input:?} (expected digits or an App Store URL)");
        return Ok(ExitCode::from(2));
    };
    let history = res.history;
    println!(
        "App ID: {} | {}{}",
        history.app_id,
        history.name,
        history
            .bundle_id
            .as_deref()
            .map(|b| format!(" | bundleId: {b}"))
            .unwrap_or_default()
    );

    let chosen = choose_version(&history, version_id.as_deref(), yes)?;

    let store = Arc::new(ItunesStore::new(client.clone(), cfg.store.clone()));
    let acquirer = Acquirer::from_config(cfg, client.clone(), store);
    let password = cfg.resolved_password()?;
    let login = acquirer
        .login(&cfg.credentials.apple_id, &password)
        .await?;

    let req = AcquireRequest {
        app_id: history.app_id.clone(),
        version_id: chosen,
        bundle_id: history.bundle_id.clone(),
    };
    let done = acquirer.acquire(&login, &req).await?;
    println!(
        "Downloaded {} bytes to {}",
        done.bytes,
        done.path.display()
    );
    Ok(ExitCode::SUCCESS)
}

/// `None` means "latest" (no external version id).
fn choose_version(history: &AggregatedHistory, preferred: Option<&str>, yes: bool) -> Result<Option<String>> {
    if history.versions.is_empty() {
        println!("No historical versions found, using the latest version");
        return Ok(preferred.map(str::to_string));
    }
    let answer = match preferred {
        Some(p) if has_version_id(&history.versions, p) => String::new(),
        _ if yes => String::new(),
        _ => {
            for (i, v) in history.versions.iter().enumerate() {
                println!("[{}] {} -> {}", i + 1, v.version, v.version_id);
            }
            prompt("Version number, version id or version label (blank for latest):")?
        }
    };
    let Some(sel) = select_version(&history.versions, preferred, &answer) else {
        return Ok(None);
    };
    if sel.fell_back {
        println!("Input not recognized, using the latest version");
    }
    println!("Using {} ({})", sel.record.version, sel.record.version_id);
    Ok(Some(sel.record.version_id))
}

fn prompt(message: &str) -> Result<String> {
    let answer = inquire::Text::new(message)
        .prompt()
        .context("reading answer")?;
    Ok(answer.trim().to_string())
}

fn pick_app<'a>(apps: &'a [AppSummary], answer: &str) -> Option<&'a AppSummary> {
    if answer.is_empty() {
        return None;
    }
    if let Ok(idx) = answer.parse::<usize>() {
        if (1..=apps.len()).contains(&idx) {
            return Some(&apps[idx - 1]);
        }
    }
    let id = resolve_app_id(answer).map_or_else(|| answer.to_string(), |r| r.id);
    apps.iter().find(|a| a.id == id)
}

fn print_apps(apps: &[AppSummary]) {
    for (i, app) in apps.iter().enumerate() {
        println!("[{}] {} | ID: {}", i + 1, app.name, app.id);
        if let Some(url) = &app.url {
            println!("    URL: {url}");
        }
        if let Some(b) = &app.bundle_id {
            println!("    Bundle ID: {b}");
        }
    }
}

fn print_history(history: &AggregatedHistory) {
    let mut header = format!("App ID: {} | {}", history.app_id, history.name);
    if let Some(b) = &history.bundle_id {
        header.push_str(&format!(" | bundleId: {b}"));
    }
    println!("{header}");
    println!("==========================================");
    if let Some(cur) = &history.current {
        println!("Current version: {} ({})", cur.version, cur.version_id);
    }
    if history.versions.is_empty() {
        println!("No historical versions found");
        return;
    }
    println!("Found {} historical versions:", history.versions.len());
    for (i, v) in history.versions.iter().enumerate() {
        let mark = if i == 0 { "* " } else { "  " };
        println!("{mark}[{}] {} (ID: {})", i + 1, v.version, v.version_id);
    }
    if let (Some(first), Some(last)) = (history.versions.first(), history.versions.last()) {
        println!("\nFirst listed: {} (ID: {})", first.version, first.version_id);
        println!("Last listed: {}", last.version);
    }
}
