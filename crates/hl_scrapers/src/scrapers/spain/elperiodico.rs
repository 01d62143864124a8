use chrono::NaiveDate;
use hl_core::{ArticleFields, ArticleRecord, Locator};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};

use crate::card::{element_text, Card};
use crate::scrapers::{utils, ArticleBody, BodyParser, CardExtractor, Interaction, LoadMore, Source, SourceMetadata};
use super::{CONSENT_BUTTON_XPATH, REGION};

lazy_static! {
    static ref DAY_FIRST: Regex = Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})").unwrap();
}

/// Pulls a date out of a listing caption such as `Barcelona 01/05/2024 - 06:00`.
/// Slashed dates are day first.
pub fn parse_caption_date(caption: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(caption) {
        return NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
    }
    let caps = DAY_FIRST.captures(caption)?;
    NaiveDate::from_ymd_opt(caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)
}

#[derive(Debug, Clone, Default)]
pub struct ElPeriodicoScraper;

impl ElPeriodicoScraper {
    pub fn new() -> Self {
        Self
    }

    const BASE_URL: &'static str = "https://www.elperiodico.com";
    const LISTING_PATH: &'static str = "/es/temas/pymes-42198";
    const LOAD_MORE_XPATH: &'static str =
        "/html/body/main/div[2]/section/div/div[1]/div[2]/section/div/div[2]/div/a";
}

impl CardExtractor for ElPeriodicoScraper {
    fn source_metadata(&self) -> SourceMetadata {
        SourceMetadata {
            name: "El Periódico",
            emoji: "📰",
            region: REGION,
            domain: Self::BASE_URL,
            listing_path: Self::LISTING_PATH,
        }
    }

    fn card_selector(&self) -> &str {
        "div.item"
    }

    fn date_of(&self, card: &Card) -> Option<NaiveDate> {
        card.select_text("span.location")
            .as_deref()
            .and_then(parse_caption_date)
    }

    fn extract(&self, card: &Card, scrape_date: NaiveDate) -> Option<ArticleRecord> {
        let title = utils::non_empty(card.select_attr("h2 a", "title"))
            .or_else(|| utils::non_empty(card.select_text("h2 a")));
        let article_url = card
            .select_attr("h2 a", "href")
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

impl BodyParser for ElPeriodicoScraper {
    fn parse_body(&self, url: &str, html: &str) -> ArticleBody {
        let document = Html::parse_document(html);

        let snippet = document
            .select(&Selector::parse("h2.subtitle").unwrap())
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty());

        // The first two bare paragraphs are the byline and the dateline.
        let paragraphs = document
            .select(&Selector::parse("p").unwrap())
            .filter(|p| p.value().attrs().next().is_none())
            .map(element_text)
            .skip(2)
            .filter(|s| !s.is_empty())
            .collect();

        ArticleBody {
            url: url.to_string(),
            snippet,
            paragraphs,
        }
    }
}

impl Source for ElPeriodicoScraper {
    fn load_more(&self) -> LoadMore {
        LoadMore {
            locator: Locator::xpath(Self::LOAD_MORE_XPATH),
            interaction: Interaction::WaitClickable,
            consent: Some(Locator::xpath(CONSENT_BUTTON_XPATH)),
            max_pages: None,
        }
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["elperiodico", "periodico"]
    }
}
