use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use crate::Result;

/// How to locate an element on a rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Self::XPath(path.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{}", s),
            Locator::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// Opaque reference to an element found on a page. Only meaningful for the
/// page that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// A browser tab the pagination driver can steer.
///
/// Interaction failures are reported as [`crate::Error::ClickIntercepted`] or
/// [`crate::Error::Timeout`] so callers can tell them apart from fatal errors.
#[async_trait]
pub trait RenderablePage: Send {
    async fn load_url(&mut self, url: &str) -> Result<()>;

    async fn maximize_viewport(&mut self) -> Result<()>;

    /// `Ok(None)` when nothing matches the locator.
    async fn find_element(&mut self, locator: &Locator) -> Result<Option<ElementHandle>>;

    async fn wait_until_clickable(&mut self, handle: ElementHandle, timeout: Duration) -> Result<ElementHandle>;

    async fn click(&mut self, handle: ElementHandle) -> Result<()>;

    async fn current_html(&mut self) -> Result<String>;

    async fn scroll_into_view(&mut self, handle: ElementHandle) -> Result<()>;

    /// Tear down the underlying browser session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Hands out a fresh, isolated page per scrape.
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderablePage>>;
}
