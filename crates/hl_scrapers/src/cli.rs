use chrono::NaiveDate;
use clap::{Args, Subcommand};
use hl_core::Result;

use crate::manager::ScraperManager;

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Scrape headlines newer than what is already stored for a source
    Update {
        /// Source name, optionally prefixed by its region (e.g. regio7 or spain/elperiodico)
        source: String,
        /// Ignore articles published before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        since: Option<NaiveDate>,
    },
    /// List available sources
    List,
    /// Fetch one article and print its lead and body paragraphs as JSON
    Body {
        source: String,
        url: String,
    },
}

pub fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| format!("Invalid date {}: {} (expected YYYY-MM-DD)", raw, e))
}

pub async fn handle_command(args: ScraperArgs, manager: &ScraperManager) -> Result<()> {
    match args.command {
        ScraperCommands::Update { source, since } => {
            let report = manager.update_with_report(&source, since).await?;
            let emoji = if report.stop.is_degraded() { "⚠️" } else { "✅" };
            println!("{} {}", emoji, report);
        }
        ScraperCommands::List => {
            println!("Available sources:");
            for source in manager.list_scrapers() {
                println!("  {}", source);
            }
        }
        ScraperCommands::Body { source, url } => {
            let body = manager.fetch_body(&source, &url).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    Ok(())
}
