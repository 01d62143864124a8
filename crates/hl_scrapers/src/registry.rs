use hl_core::{Error, Result};
use std::sync::Arc;

use crate::config::ScrapeConfig;
use crate::logging::Logger;
use crate::pagination::{DriverTimings, PaginationDriver};
use crate::scrapers::{self, Source};

pub type ScraperFactory = Box<dyn Fn() -> Arc<dyn Source> + Send + Sync>;

/// Factories for every built-in source.
pub fn get_scraper_factories() -> Vec<ScraperFactory> {
    scrapers::spain::get_scrapers()
        .into_iter()
        .map(|scraper| Box::new(move || scraper.clone()) as ScraperFactory)
        .collect()
}

/// A resolved source: the extractor plus a driver configured for its listing.
#[derive(Clone)]
pub struct ScraperSource {
    pub id: String,
    pub scraper: Arc<dyn Source>,
    pub driver: PaginationDriver,
}

/// Lowercase, accent-free, alphanumeric only: `Regió7` → `regio7`.
pub fn normalize_source_id(source: &str) -> String {
    source
        .chars()
        .map(|c| match c {
            'à' | 'á' | 'À' | 'Á' => 'a',
            'è' | 'é' | 'È' | 'É' => 'e',
            'í' | 'ï' | 'Í' | 'Ï' => 'i',
            'ò' | 'ó' | 'Ò' | 'Ó' => 'o',
            'ú' | 'ü' | 'Ú' | 'Ü' => 'u',
            'ç' | 'Ç' => 'c',
            'ñ' | 'Ñ' => 'n',
            other => other,
        })
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Accepts `name` or `region/name`.
fn parse_source(source: &str) -> Result<(Option<&str>, &str)> {
    let parts: Vec<&str> = source.split('/').collect();
    match parts.as_slice() {
        [name] if !name.trim().is_empty() => Ok((None, name)),
        [region, name] if !name.trim().is_empty() => Ok((Some(region), name)),
        _ => Err(Error::UnknownSource(format!(
            "{} (expected name or region/name)",
            source
        ))),
    }
}

fn matches(scraper: &dyn Source, region: Option<&str>, name: &str) -> bool {
    let meta = scraper.source_metadata();
    if let Some(region) = region {
        if normalize_source_id(region) != normalize_source_id(meta.region.name) {
            return false;
        }
    }
    let wanted = normalize_source_id(name);
    normalize_source_id(meta.name) == wanted
        || scraper.cli_names().iter().any(|n| normalize_source_id(n) == wanted)
}

fn canonical_id(scraper: &dyn Source) -> String {
    scraper
        .cli_names()
        .first()
        .map(|n| n.to_string())
        .unwrap_or_else(|| normalize_source_id(scraper.source_metadata().name))
}

/// `region/id` for every registered source, in registration order.
pub fn available_sources(factories: &[ScraperFactory]) -> Vec<String> {
    factories
        .iter()
        .map(|factory| {
            let scraper = factory();
            format!("{}/{}", scraper.source_metadata().region.name, canonical_id(scraper.as_ref()))
        })
        .collect()
}

/// Find the source for `requested` and build its driver from `config`.
pub fn resolve(factories: &[ScraperFactory], requested: &str, config: &ScrapeConfig) -> Result<ScraperSource> {
    let (region, name) = parse_source(requested)?;

    let scraper = factories
        .iter()
        .map(|factory| factory())
        .find(|scraper| matches(scraper.as_ref(), region, name))
        .ok_or_else(|| Error::UnknownSource(requested.to_string()))?;

    let meta = scraper.source_metadata();
    let id = canonical_id(scraper.as_ref());
    let driver = PaginationDriver::new(
        meta.listing_url(),
        scraper.load_more(),
        DriverTimings::from_config(config),
        config.max_pages,
    )
    .with_logger(Logger::for_source(&id));

    Ok(ScraperSource { id, scraper, driver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_source_id() {
        assert_eq!(normalize_source_id("Regió7"), "regio7");
        assert_eq!(normalize_source_id("El Periódico"), "elperiodico");
        assert_eq!(normalize_source_id("ElPeriodico"), "elperiodico");
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(parse_source("spain/regio7").unwrap(), (Some("spain"), "regio7"));
        assert_eq!(parse_source("regio7").unwrap(), (None, "regio7"));
        assert!(parse_source("spain/").is_err());
    }

    #[test]
    fn test_resolve_by_region_and_name() {
        let factories = get_scraper_factories();
        let source = resolve(&factories, "spain/regio7", &ScrapeConfig::default()).unwrap();
        assert_eq!(source.id, "regio7");
        assert_eq!(source.scraper.source_metadata().name, "Regió7");
    }

    #[test]
    fn test_resolve() {
        let factories = get_scraper_factories();
        let config = ScrapeConfig::default();

        let regio7 = resolve(&factories, "Regió7", &config).unwrap();
        assert_eq!(regio7.id, "regio7");
        assert_eq!(regio7.driver.listing_url(), "https://www.regio7.cat/economia/");
        assert_eq!(regio7.driver.max_pages(), 40);

        let periodico = resolve(&factories, "spain/elperiodico", &config).unwrap();
        assert_eq!(periodico.scraper.source_metadata().domain, "https://www.elperiodico.com");
        assert_eq!(periodico.driver.max_pages(), config.max_pages);

        assert!(resolve(&factories, "El Periódico", &config).is_ok());
    }

    #[test]
    fn test_available_sources() {
        let sources = available_sources(&get_scraper_factories());
        assert_eq!(sources, vec!["spain/elperiodico", "spain/regio7"]);
    }

    #[test]
    fn test_unknown_sources() {
        let factories = get_scraper_factories();
        let config = ScrapeConfig::default();

        for source in ["lavanguardia", "argentina/regio7", "", "a/b/c", "spain/"] {
            match resolve(&factories, source, &config) {
                Err(Error::UnknownSource(_)) => {}
                other => panic!("expected unknown source for {:?}, got {:?}", source, other.map(|s| s.id)),
            }
        }
    }
}
