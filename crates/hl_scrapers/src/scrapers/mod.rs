use chrono::NaiveDate;
use hl_core::{ArticleRecord, Locator};
use serde::Serialize;

use crate::card::Card;

pub mod spain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub emoji: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    pub name: &'static str,
    pub emoji: &'static str,
    pub region: Region,
    /// Scheme and host, e.g. `https://www.regio7.cat`. Also the storage key
    /// the watermark is computed over.
    pub domain: &'static str,
    /// Section path of the listing page, e.g. `/economia/`.
    pub listing_path: &'static str,
}

impl SourceMetadata {
    pub fn listing_url(&self) -> String {
        format!("{}{}", self.domain, self.listing_path)
    }
}

/// Turns rendered listing cards into article records.
pub trait CardExtractor: Send + Sync {
    fn source_metadata(&self) -> SourceMetadata;

    /// CSS selector matching every card on the listing page.
    fn card_selector(&self) -> &str;

    /// Publish date of a card, `None` when it cannot be resolved.
    fn date_of(&self, card: &Card) -> Option<NaiveDate>;

    /// `None` for partial or malformed cards. Never panics.
    fn extract(&self, card: &Card, scrape_date: NaiveDate) -> Option<ArticleRecord>;
}

/// Lead paragraph and body text of a single article page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleBody {
    pub url: String,
    pub snippet: Option<String>,
    pub paragraphs: Vec<String>,
}

pub trait BodyParser: Send + Sync {
    fn parse_body(&self, url: &str, html: &str) -> ArticleBody;
}

/// How the "load more" control has to be poked before it responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Wait (bounded) until the control is clickable, then click.
    WaitClickable,
    /// Scroll the control into view, then click.
    ScrollIntoView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMore {
    pub locator: Locator,
    pub interaction: Interaction,
    /// Cookie-consent button to dismiss after the first load.
    pub consent: Option<Locator>,
    /// Per-source ceiling on rendered pages, on top of the configured one.
    pub max_pages: Option<usize>,
}

/// A complete source variant: card extraction, body parsing and the
/// pagination settings its listing page needs.
pub trait Source: CardExtractor + BodyParser {
    fn load_more(&self) -> LoadMore;

    /// Returns a list of CLI shorthand names for this source
    fn cli_names(&self) -> Vec<&str> {
        vec![]
    }
}

/// Common utilities for sources
pub(crate) mod utils {
    use url::Url;

    /// Absolute form of `href` relative to `domain`, without fragment.
    pub fn resolve_url(domain: &str, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let mut url = Url::parse(domain).ok()?.join(href).ok()?;
        url.set_fragment(None);
        Some(url)
    }

    pub fn non_empty(text: Option<String>) -> Option<String> {
        text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
    }
}
