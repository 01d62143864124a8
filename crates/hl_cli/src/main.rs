use chrono::NaiveDate;
use clap::Parser;
use hl_core::Result;
use hl_scrapers::cli::{handle_command, parse_date, ScraperArgs, ScraperCommands as HlScraperCommands};
use hl_scrapers::logging::init_logging;
use hl_scrapers::{ScrapeConfig, ScraperManager, WebDriverFactory};
use hl_storage::StorageKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// `1h15m30s`, `30m`, `1d`; a bare number is seconds.
fn parse_interval(s: &str) -> std::result::Result<Duration, String> {
    let mut seconds = 0u64;
    let mut digits = String::new();
    for c in s.chars().filter(|c| !c.is_whitespace()) {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            other => return Err(format!("unknown interval unit '{}'", other)),
        };
        let n: u64 = digits.parse().map_err(|_| format!("missing number before '{}'", c))?;
        seconds = seconds.saturating_add(n.saturating_mul(unit));
        digits.clear();
    }
    if !digits.is_empty() {
        let n: u64 = digits.parse().map_err(|e| format!("bad interval {}: {}", s, e))?;
        seconds = seconds.saturating_add(n);
    }
    if seconds == 0 {
        return Err("interval must be positive".to_string());
    }
    Ok(Duration::from_secs(seconds))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Incremental headline harvester", long_about = None)]
pub struct Cli {
    /// TOML file with harvester settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Storage backend: memory or sqlite
    #[arg(long)]
    storage: Option<StorageKind>,
    /// Database path for the sqlite backend
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    table: Option<String>,
    #[arg(long)]
    webdriver_url: Option<String>,
    /// Show the browser window instead of running headless
    #[arg(long)]
    show_browser: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Scrape headlines newer than what is already stored for a source
    Update {
        /// Source name, optionally prefixed by its region (e.g. regio7 or spain/elperiodico)
        source: String,
        /// Ignore articles published before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        since: Option<NaiveDate>,
        /// Run in periodic mode with the specified interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long, value_parser = parse_interval)]
        interval: Option<Duration>,
    },
    /// List available sources
    List,
    /// Fetch one article and print its lead and body paragraphs as JSON
    Body { source: String, url: String },
}

impl Cli {
    fn scrape_config(&self) -> Result<ScrapeConfig> {
        let mut config = match &self.config {
            Some(path) => ScrapeConfig::load(path)?,
            None => ScrapeConfig::default(),
        };
        if let Some(storage) = self.storage {
            config.storage = storage;
        }
        if let Some(url) = &self.backend_url {
            config.backend_url = Some(url.clone());
        }
        if let Some(table) = &self.table {
            config.table = table.clone();
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if self.show_browser {
            config.headless = false;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = cli.scrape_config()?;

    let storage = hl_storage::create_storage(config.storage, config.backend_url.as_deref()).await?;
    info!("🏦 Storage backend initialized (using {})", config.storage);

    let pages = Arc::new(WebDriverFactory::from_config(&config));
    let manager = ScraperManager::new(storage, pages, config);

    match cli.command {
        Commands::Update { source, since, interval } => {
            let args = ScraperArgs {
                command: HlScraperCommands::Update { source, since },
            };

            if let Some(interval) = interval {
                info!("Running in periodic mode with {}s interval", interval.as_secs());
                loop {
                    info!("Starting update cycle");
                    if let Err(e) = handle_command(args.clone(), &manager).await {
                        error!("Error during update: {}", e);
                    }
                    info!("Waiting {}s before next update", interval.as_secs());
                    tokio::time::sleep(interval).await;
                }
            } else {
                handle_command(args, &manager).await?;
            }
        }
        Commands::List => {
            let args = ScraperArgs {
                command: HlScraperCommands::List,
            };
            handle_command(args, &manager).await?;
        }
        Commands::Body { source, url } => {
            let args = ScraperArgs {
                command: HlScraperCommands::Body { source, url },
            };
            handle_command(args, &manager).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_interval("1h15m30s"), Ok(Duration::from_secs(4530)));
        assert_eq!(parse_interval("1d 2h"), Ok(Duration::from_secs(93_600)));
        assert_eq!(parse_interval("90"), Ok(Duration::from_secs(90)));
        assert!(parse_interval("1w").is_err());
        assert!(parse_interval("h").is_err());
        assert!(parse_interval("").is_err());
        assert!(parse_interval("0s").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "hl",
            "--storage",
            "sqlite",
            "--backend-url",
            "data/headlines.db",
            "--show-browser",
            "update",
            "regio7",
            "--since",
            "2024-02-01",
            "--interval",
            "30m",
        ])
        .unwrap();

        let config = cli.scrape_config().unwrap();
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.backend_url.as_deref(), Some("data/headlines.db"));
        assert!(!config.headless);
        assert_eq!(config.table, "pymes_news_headlines");

        match cli.command {
            Commands::Update { since, interval, .. } => {
                assert_eq!(since, NaiveDate::from_ymd_opt(2024, 2, 1));
                assert_eq!(interval, Some(Duration::from_secs(1800)));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_storage_is_rejected() {
        assert!(Cli::try_parse_from(["hl", "--storage", "qdrant", "list"]).is_err());
    }
}
