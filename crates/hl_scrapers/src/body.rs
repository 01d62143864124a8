use hl_core::{Error, Result};
use url::Url;

use crate::scrapers::{ArticleBody, BodyParser};

/// Download a single article page and run the source's body parser on it.
pub async fn fetch_body<P: BodyParser + ?Sized>(parser: &P, url: &str) -> Result<ArticleBody> {
    let parsed = Url::parse(url).map_err(|e| Error::Config(format!("Invalid article URL {}: {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!("Unsupported URL scheme: {}", parsed.scheme())));
    }

    let response = reqwest::get(parsed).await?.error_for_status()?;
    let html = response.text().await?;
    Ok(parser.parse_body(url, &html))
}
