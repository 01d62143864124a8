use std::sync::Arc;
use crate::scrapers::{Region, Source};

pub mod elperiodico;
pub mod regio7;

pub use elperiodico::ElPeriodicoScraper;
pub use regio7::Regio7Scraper;

pub const REGION: Region = Region {
    name: "spain",
    emoji: "🇪🇸",
};

/// Both sites share the same consent manager; its "accept" button.
pub const CONSENT_BUTTON_XPATH: &str = "/html/body/div[1]/div/div/div/div/div/div[2]/button[2]";

/// Returns a vector of all available Spanish sources
pub fn get_scrapers() -> Vec<Arc<dyn Source>> {
    vec![
        Arc::new(ElPeriodicoScraper::new()),
        Arc::new(Regio7Scraper::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_scrapers() {
        let scrapers = get_scrapers();
        assert_eq!(scrapers.len(), 2);
        assert!(scrapers.iter().all(|s| s.source_metadata().region == REGION));

        let domains: Vec<_> = scrapers.iter().map(|s| s.source_metadata().domain).collect();
        assert_eq!(domains, vec!["https://www.elperiodico.com", "https://www.regio7.cat"]);
    }
}
