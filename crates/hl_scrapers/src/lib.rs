pub mod body;
pub mod browser;
pub mod card;
pub mod cli;
pub mod config;
pub mod logging;
pub mod manager;
pub mod pagination;
pub mod registry;
pub mod scrapers;
pub mod testing;


pub use browser::{WebDriverFactory, WebDriverPage};
pub use card::{query_all, Card};
pub use cli::{handle_command, ScraperArgs, ScraperCommands};
pub use config::ScrapeConfig;
pub use manager::{ScraperManager, UpdateReport};
pub use pagination::{Pagination, PaginationDriver, StopReason};
pub use registry::{get_scraper_factories, ScraperFactory, ScraperSource};
pub use scrapers::Source;

pub mod prelude {
    pub use super::scrapers::{CardExtractor, Source};
    pub use super::{ScrapeConfig, ScraperManager, StopReason};
    pub use hl_core::{ArticleRecord, Error, Result};
}
