use hl_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};

/// One rendered list item, detached from the page it came from.
///
/// Cards keep their own HTML so a batch can outlive the DOM snapshot it was
/// cut from and be carried across await points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    html: String,
}

impl Card {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn from_element(element: ElementRef<'_>) -> Self {
        Self::new(element.html())
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    fn with_root<R>(&self, f: impl FnOnce(ElementRef<'_>) -> Option<R>) -> Option<R> {
        let fragment = Html::parse_fragment(&self.html);
        let root = fragment.root_element().children().find_map(ElementRef::wrap)?;
        f(root)
    }

    /// Attribute of the card element itself.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.with_root(|root| root.value().attr(name).map(str::to_string))
    }

    /// Whitespace-collapsed text of the whole card.
    pub fn text(&self) -> String {
        self.with_root(|root| Some(element_text(root))).unwrap_or_default()
    }

    /// Attribute of the first descendant matching `selector`.
    pub fn select_attr(&self, selector: &str, name: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        self.with_root(|root| {
            root.select(&selector)
                .next()
                .and_then(|el| el.value().attr(name))
                .map(str::to_string)
        })
    }

    /// Text of the first descendant matching `selector`.
    pub fn select_text(&self, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        self.with_root(|root| root.select(&selector).next().map(element_text))
    }
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::InvalidSelector(format!("{}: {}", selector, e)))
}

/// Every element of `html` matching `selector`, in document order.
pub fn query_all(html: &str, selector: &str) -> Result<Vec<Card>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).map(Card::from_element).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
            <div class="item">
                <h2><a href="/es/economia/20240501/one.html" title="First">First
                    headline</a></h2>
                <span class="location">01/05/2024</span>
            </div>
            <div class="item"><h2>No link</h2></div>
            <div class="other">ignored</div>
        </body></html>
    "#;

    #[test]
    fn test_query_all() {
        let cards = query_all(LISTING, "div.item").unwrap();
        assert_eq!(cards.len(), 2);
        assert!(query_all(LISTING, "article").unwrap().is_empty());
        assert!(query_all(LISTING, "div[").is_err());
    }

    #[test]
    fn test_card_lookups() {
        let cards = query_all(LISTING, "div.item").unwrap();
        let card = &cards[0];

        assert_eq!(card.attr("class").as_deref(), Some("item"));
        assert_eq!(card.select_attr("h2 a", "title").as_deref(), Some("First"));
        assert_eq!(card.select_text("h2 a").as_deref(), Some("First headline"));
        assert_eq!(card.select_text("span.location").as_deref(), Some("01/05/2024"));
        assert!(card.text().starts_with("First headline"));

        assert_eq!(cards[1].select_attr("h2 a", "href"), None);
        assert_eq!(cards[1].select_text("span.location"), None);
    }

    #[test]
    fn test_anchor_card_attributes() {
        let card = Card::new(r#"<a class="new__media" href="/economia/2024/05/01/x.html" title="X">X</a>"#);
        assert_eq!(card.attr("href").as_deref(), Some("/economia/2024/05/01/x.html"));
        assert_eq!(card.attr("title").as_deref(), Some("X"));
        assert_eq!(card.attr("data-missing"), None);
    }
}
