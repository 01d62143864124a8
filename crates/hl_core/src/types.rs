use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One harvested headline, as persisted in the headlines table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub content_hash: String,
    pub external_id: Uuid,
    pub title: String,
    pub publish_date: NaiveDate,
    pub scrape_date: NaiveDate,
    pub source_domain: String,
    pub listing_path: String,
    pub article_url: String,
}

/// Hex SHA-256 of an article URL. Stable across runs and machines; this is
/// the dedup key of the headlines table.
pub fn content_hash(article_url: &str) -> String {
    format!("{:x}", Sha256::digest(article_url.as_bytes()))
}

/// Raw fields pulled out of a card, before validation.
#[derive(Debug, Clone)]
pub struct ArticleFields {
    pub title: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub article_url: Option<String>,
    pub scrape_date: NaiveDate,
    pub source_domain: String,
    pub listing_path: String,
}

impl ArticleFields {
    /// Returns `None` unless title, publish date and URL are all present.
    pub fn build(self) -> Option<ArticleRecord> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())?;
        let publish_date = self.publish_date?;
        let article_url = self
            .article_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())?;

        Some(ArticleRecord {
            content_hash: content_hash(&article_url),
            external_id: Uuid::new_v4(),
            title,
            publish_date,
            scrape_date: self.scrape_date,
            source_domain: self.source_domain,
            listing_path: self.listing_path,
            article_url,
        })
    }
}
