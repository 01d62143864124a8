//! The "load more" loop.
//!
//! A listing page starts with one page of cards; every successful click on
//! the load-more control appends the next page to the same DOM. After each
//! page the driver re-reads the whole card set and decides whether enough
//! history is on screen.

use chrono::NaiveDate;
use hl_core::{ElementHandle, RenderablePage, Result};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

use crate::card::{query_all, Card};
use crate::config::ScrapeConfig;
use crate::logging::Logger;
use crate::scrapers::{CardExtractor, Interaction, LoadMore};

/// Why the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// No load-more control left on the page.
    Exhausted,
    /// The current batch reaches back past the bound.
    CutoffReached,
    /// A click was intercepted or a wait timed out. The cards are whatever
    /// was on screen before the failure.
    Degraded(String),
    /// The page ceiling was hit before any other stop condition.
    PageLimit,
}

impl StopReason {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StopReason::Degraded(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "exhausted"),
            StopReason::CutoffReached => write!(f, "cutoff reached"),
            StopReason::Degraded(reason) => write!(f, "degraded: {}", reason),
            StopReason::PageLimit => write!(f, "page limit"),
        }
    }
}

/// Result of one pagination run.
#[derive(Debug, Clone)]
pub struct Pagination {
    /// Every card rendered when the loop stopped (cumulative, not the last page only).
    pub cards: Vec<Card>,
    pub stop: StopReason,
    /// Listing pages rendered, counting the initial one.
    pub pages: usize,
}

/// Cutoff-stop rule. With a bound, stop once the earliest resolvable date in
/// the batch is strictly before it. Undated cards do not take part; a batch
/// without any dated card never stops the loop, and neither does a missing
/// bound.
pub fn cutoff_reached<I>(dates: I, bound: Option<NaiveDate>) -> bool
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    let Some(bound) = bound else {
        return false;
    };
    dates
        .into_iter()
        .flatten()
        .min()
        .map_or(false, |earliest| earliest < bound)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTimings {
    pub settle: Duration,
    pub pacing: Duration,
    pub clickable_timeout: Duration,
}

impl DriverTimings {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            settle: config.settle_delay(),
            pacing: config.pacing_delay(),
            clickable_timeout: config.clickable_timeout(),
        }
    }

    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            pacing: Duration::ZERO,
            clickable_timeout: Duration::ZERO,
        }
    }
}

/// Drives one source's listing page. Holds no page state itself, so the same
/// driver can run against any number of pages one after another.
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    listing_url: String,
    load_more: LoadMore,
    timings: DriverTimings,
    max_pages: usize,
    logger: Logger,
}

impl PaginationDriver {
    pub fn new(listing_url: impl Into<String>, load_more: LoadMore, timings: DriverTimings, max_pages: usize) -> Self {
        let max_pages = load_more.max_pages.map_or(max_pages, |cap| cap.min(max_pages));
        Self {
            listing_url: listing_url.into(),
            load_more,
            timings,
            max_pages: max_pages.max(1),
            logger: Logger::new(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Run the loop to completion. Only non-transient page errors are
    /// returned as `Err`; the caller still owns (and must close) `page`.
    pub async fn run<E: CardExtractor + ?Sized>(
        &self,
        page: &mut dyn RenderablePage,
        extractor: &E,
        bound: Option<NaiveDate>,
    ) -> Result<Pagination> {
        match bound {
            Some(bound) => self.logger.info(&format!("opening {} (bound {})", self.listing_url, bound)),
            None => self.logger.info(&format!("opening {} (no bound, full history)", self.listing_url)),
        }

        if let Err(e) = self.open_listing(page).await {
            return self.degrade(e, Vec::new(), 0);
        }

        let mut cards = match self.render(page, extractor).await {
            Ok(cards) => cards,
            Err(e) => return self.degrade(e, Vec::new(), 0),
        };
        let mut pages = 1;

        let stop = loop {
            self.logger.debug(&format!("page={} cards={}", pages, cards.len()));

            if cutoff_reached(cards.iter().map(|c| extractor.date_of(c)), bound) {
                break StopReason::CutoffReached;
            }
            if pages >= self.max_pages {
                break StopReason::PageLimit;
            }

            match self.load_next(page).await {
                Ok(true) => {}
                Ok(false) => break StopReason::Exhausted,
                Err(e) if e.is_transient() => break self.degraded_reason(&e, pages + 1),
                Err(e) => return Err(e),
            }
            pages += 1;
            sleep(self.timings.pacing).await;

            cards = match self.render(page, extractor).await {
                Ok(next) => next,
                Err(e) if e.is_transient() => break self.degraded_reason(&e, pages),
                Err(e) => return Err(e),
            };
        };

        self.logger.info(&format!("stopped after {} page(s) with {} cards: {}", pages, cards.len(), stop));
        Ok(Pagination { cards, stop, pages })
    }

    fn degrade(&self, e: hl_core::Error, cards: Vec<Card>, pages: usize) -> Result<Pagination> {
        if !e.is_transient() {
            return Err(e);
        }
        let stop = self.degraded_reason(&e, pages + 1);
        Ok(Pagination { cards, stop, pages })
    }

    fn degraded_reason(&self, e: &hl_core::Error, page: usize) -> StopReason {
        self.logger.warn(&format!("page {} failed, keeping what was loaded so far: {}", page, e));
        StopReason::Degraded(e.to_string())
    }

    async fn open_listing(&self, page: &mut dyn RenderablePage) -> Result<()> {
        page.maximize_viewport().await?;
        page.load_url(&self.listing_url).await?;
        sleep(self.timings.settle).await;

        if let Some(consent) = &self.load_more.consent {
            let dismissed = match page.find_element(consent).await {
                Ok(Some(button)) => page.click(button).await.map(|_| true),
                Ok(None) => Ok(false),
                Err(e) => Err(e),
            };
            match dismissed {
                Ok(true) => self.logger.debug("consent dialog dismissed"),
                Ok(false) => self.logger.debug("no consent dialog"),
                Err(e) => self.logger.warn(&format!("could not dismiss consent dialog: {}", e)),
            }
        }
        Ok(())
    }

    /// `Ok(false)` when there is no load-more control to click.
    async fn load_next(&self, page: &mut dyn RenderablePage) -> Result<bool> {
        let Some(button) = page.find_element(&self.load_more.locator).await? else {
            return Ok(false);
        };
        let button = self.prepare(page, button).await?;
        page.click(button).await?;
        Ok(true)
    }

    async fn prepare(&self, page: &mut dyn RenderablePage, button: ElementHandle) -> Result<ElementHandle> {
        match self.load_more.interaction {
            Interaction::WaitClickable => page.wait_until_clickable(button, self.timings.clickable_timeout).await,
            Interaction::ScrollIntoView => {
                page.scroll_into_view(button).await?;
                Ok(button)
            }
        }
    }

    async fn render<E: CardExtractor + ?Sized>(&self, page: &mut dyn RenderablePage, extractor: &E) -> Result<Vec<Card>> {
        let html = page.current_html().await?;
        query_all(&html, extractor.card_selector())
    }
}
