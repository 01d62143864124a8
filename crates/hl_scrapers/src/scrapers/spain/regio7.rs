use chrono::NaiveDate;
use hl_core::{ArticleFields, ArticleRecord, Locator};
use scraper::{Html, Selector};

use crate::card::{element_text, Card};
use crate::scrapers::{utils, ArticleBody, BodyParser, CardExtractor, Interaction, LoadMore, Source, SourceMetadata};
use super::{CONSENT_BUTTON_XPATH, REGION};

#[derive(Debug, Clone, Default)]
pub struct Regio7Scraper;

impl Regio7Scraper {
    pub fn new() -> Self {
        Self
    }

    const BASE_URL: &'static str = "https://www.regio7.cat";
    const LISTING_PATH: &'static str = "/economia/";
    const SECTION: &'static str = "economia";

    /// Article URLs carry their date right after the section:
    /// `/economia/2024/05/01/slug.html`.
    fn date_from_href(href: &str) -> Option<NaiveDate> {
        let url = utils::resolve_url(Self::BASE_URL, href)?;
        let mut segments = url
            .path_segments()?
            .skip_while(|s| *s != Self::SECTION)
            .skip(1);
        let year = segments.next()?.parse().ok()?;
        let month = segments.next()?.parse().ok()?;
        let day = segments.next()?.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

impl CardExtractor for Regio7Scraper {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "Regió7",
            emoji: "⛰️",
            region: REGION,
            domain: Self::BASE_URL,
            listing_path: Self::LISTING_PATH,
        }
    }

    fn card_selector(&self) -> &str {
        r#"a.new__media[href*="economia"]"#
    }

    fn date_of(&self, card: &Card) -> Option<NaiveDate> {
        card.attr("href").as_deref().and_then(Self::date_from_href)
    }

    fn extract(&self, card: &Card, scrape_date: NaiveDate) -> Option<ArticleRecord> {
        let title = utils::non_empty(card.attr("title")).or_else(|| utils::non_empty(Some(card.text())));
        let article_url = card
            .attr("href")
            .and_then(|href| utils::resolve_url(Self::BASE_URL, &href))
            .map(|url| url.to_string());

        ArticleFields {
            title,
            publish_date: self.date_of(card),
            article_url,
            scrape_date,
            source_domain: Self::BASE_URL.to_string(),
            listing_path: Self::LISTING_PATH.to_string(),
        }
        .build()
    }
}

impl BodyParser for Regio7Scraper {
    fn parse_body(&self, url: &str, html: &str) -> ArticleBody {
        let document = Html::parse_document(html);

        let snippet = document
            .select(&Selector::parse("h1.headline-article__head").unwrap())
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());

        let paragraphs = document
            .select(&Selector::parse("div.bbnx-module").unwrap())
            .next()
            .map(|module| {
                module
                    .select(&Selector::parse("p, h2").unwrap())
                    .map(element_text)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        ArticleBody {
            url: url.to_string(),
            snippet,
            paragraphs,
        }
    }
}

impl Source for Regio7Scraper {
    fn load_more(&self) -> LoadMore {
        LoadMore {
            locator: Locator::css(".btn-view-more"),
            interaction: Interaction::ScrollIntoView,
            consent: Some(Locator::xpath(CONSENT_BUTTON_XPATH)),
            // The listing stops serving new cards after about forty pages.
            max_pages: Some(40),
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["regio7"]
    }
}
