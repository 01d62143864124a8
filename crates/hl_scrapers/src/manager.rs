use chrono::{NaiveDate, Utc};
use hl_core::{ArticleRecord, Error, HeadlineStorage, PageFactory, Result, RowFilter};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::body;
use crate::config::ScrapeConfig;
use crate::logging::Logger;
use crate::pagination::StopReason;
use crate::registry::{self, get_scraper_factories, ScraperFactory, ScraperSource};
use crate::scrapers::ArticleBody;

/// What one incremental update did, stage by stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub source: String,
    pub bound: Option<NaiveDate>,
    pub stop: StopReason,
    pub pages: usize,
    pub cards_seen: usize,
    pub invalid_cards: usize,
    pub below_bound: usize,
    pub duplicates: usize,
    pub inserted: usize,
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} new of {} cards over {} page(s) ({}; {} invalid, {} before bound, {} duplicates)",
            self.source,
            self.inserted,
            self.cards_seen,
            self.pages,
            self.stop,
            self.invalid_cards,
            self.below_bound,
            self.duplicates
        )
    }
}

/// Most recent publish date among `rows`.
pub fn latest_publish_date(rows: &[ArticleRecord]) -> Option<NaiveDate> {
    rows.iter().map(|r| r.publish_date).max()
}

/// The later of the stored watermark and the caller's bound. Either may be
/// missing; both missing means the full history is wanted.
pub fn effective_bound(watermark: Option<NaiveDate>, explicit: Option<NaiveDate>) -> Option<NaiveDate> {
    watermark.max(explicit)
}

/// Drops records whose `content_hash` was already seen earlier in the batch.
/// Returns the survivors and how many were dropped.
pub fn dedup_by_hash(records: Vec<ArticleRecord>) -> (Vec<ArticleRecord>, usize) {
    let mut seen = HashSet::new();
    let before = records.len();
    let unique: Vec<_> = records
        .into_iter()
        .filter(|r| seen.insert(r.content_hash.clone()))
        .collect();
    let dropped = before - unique.len();
    (unique, dropped)
}

pub struct ScraperManager {
    storage: Arc<dyn HeadlineStorage>,
    pages: Arc<dyn PageFactory>,
    config: ScrapeConfig,
    factories: Vec<ScraperFactory>,
}

impl ScraperManager {
    pub fn new(storage: Arc<dyn HeadlineStorage>, pages: Arc<dyn PageFactory>, config: ScrapeConfig) -> Self {
        Self {
            storage,
            pages,
            config,
            factories: get_scraper_factories(),
        }
    }

    pub fn add_scraper_factory(&mut self, factory: ScraperFactory) {
        self.factories.push(factory);
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn list_scrapers(&self) -> Vec<String> {
        registry::available_sources(&self.factories)
    }

    pub fn resolve(&self, source_id: &str) -> Result<ScraperSource> {
        registry::resolve(&self.factories, source_id, &self.config)
    }

    /// Latest stored publish date for `domain`, `None` when nothing is stored.
    pub async fn watermark(&self, domain: &str) -> Result<Option<NaiveDate>> {
        let rows = self
            .storage
            .read_table(&self.config.table, &RowFilter::domain(domain))
            .await
            .map_err(|e| match e {
                Error::Storage(_) => e,
                other => Error::Storage(format!("Failed to read watermark: {}", other)),
            })?;
        Ok(latest_publish_date(&rows))
    }

    /// Scrape everything newer than the stored watermark (or `since`, if
    /// later) and return how many rows were inserted.
    pub async fn update(&self, source_id: &str, since: Option<NaiveDate>) -> Result<usize> {
        Ok(self.update_with_report(source_id, since).await?.inserted)
    }

    pub async fn update_with_report(&self, source_id: &str, since: Option<NaiveDate>) -> Result<UpdateReport> {
        let source = self.resolve(source_id)?;
        let logger = Logger::for_source(&source.id);
        let meta = source.scraper.source_metadata();

        let watermark = self.watermark(meta.domain).await?;
        let bound = effective_bound(watermark, since);
        logger.debug(&format!("watermark={:?} since={:?} bound={:?}", watermark, since, bound));

        let mut page = self.pages.open().await?;
        let run = source.driver.run(page.as_mut(), source.scraper.as_ref(), bound).await;
        if let Err(e) = page.close().await {
            logger.warn(&format!("failed to close page: {}", e));
        }
        let pagination = run?;

        let scrape_date = Utc::now().date_naive();
        let cards_seen = pagination.cards.len();
        let mut invalid_cards = 0;
        let mut below_bound = 0;
        let mut records = Vec::with_capacity(cards_seen);
        for card in &pagination.cards {
            let Some(record) = source.scraper.extract(card, scrape_date) else {
                invalid_cards += 1;
                logger.debug(&format!("dropping invalid card: {}", card.text()));
                continue;
            };
            if bound.map_or(false, |bound| record.publish_date < bound) {
                below_bound += 1;
                continue;
            }
            records.push(record);
        }

        let (records, duplicates) = dedup_by_hash(records);
        let inserted = if records.is_empty() {
            0
        } else {
            self.storage.upsert_table(&self.config.table, &records).await?
        };

        let report = UpdateReport {
            source: source.id,
            bound,
            stop: pagination.stop,
            pages: pagination.pages,
            cards_seen,
            invalid_cards,
            below_bound,
            duplicates,
            inserted,
        };
        if report.stop.is_degraded() {
            logger.warn(&report.to_string());
        } else {
            logger.info(&report.to_string());
        }
        Ok(report)
    }

    /// Download and parse one article page with the given source's parser.
    pub async fn fetch_body(&self, source_id: &str, url: &str) -> Result<ArticleBody> {
        let source = self.resolve(source_id)?;
        body::fetch_body(source.scraper.as_ref(), url).await
    }
}
