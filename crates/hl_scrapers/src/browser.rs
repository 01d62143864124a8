//! [`RenderablePage`] over a WebDriver session (chromedriver by default).

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use hl_core::{ElementHandle, Error, Locator, PageFactory, RenderablePage, Result};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

use crate::config::ScrapeConfig;

const CLICKABLE_POLL: Duration = Duration::from_millis(250);

/// Map a WebDriver command error onto the crate error, keeping the
/// transient interaction failures distinguishable.
fn classify(context: &str, e: CmdError) -> Error {
    let message = e.to_string();
    let lower = message.to_lowercase();
    if lower.contains("intercepted") {
        Error::ClickIntercepted(format!("{}: {}", context, message))
    } else if lower.contains("timeout") || lower.contains("timed out") {
        Error::Timeout(format!("{}: {}", context, message))
    } else {
        Error::Browser(format!("{}: {}", context, message))
    }
}

pub struct WebDriverPage {
    client: Client,
    elements: HashMap<u64, Element>,
    next_handle: u64,
    page_load_timeout: Duration,
    closed: bool,
}

impl WebDriverPage {
    pub fn new(client: Client, page_load_timeout: Duration) -> Self {
        Self {
            client,
            elements: HashMap::new(),
            next_handle: 1,
            page_load_timeout,
            closed: false,
        }
    }

    fn element(&self, handle: ElementHandle) -> Result<&Element> {
        self.elements
            .get(&handle.0)
            .ok_or_else(|| Error::Browser(format!("Stale element handle {}", handle.0)))
    }

    async fn is_clickable(&self, element: &Element) -> Result<bool> {
        let displayed = element.is_displayed().await.map_err(|e| classify("is_displayed", e))?;
        if !displayed {
            return Ok(false);
        }
        element.is_enabled().await.map_err(|e| classify("is_enabled", e))
    }
}

#[async_trait]
impl RenderablePage for WebDriverPage {
    async fn load_url(&mut self, url: &str) -> Result<()> {
        self.elements.clear();
        match timeout(self.page_load_timeout, self.client.goto(url)).await {
            Ok(result) => result.map_err(|e| classify("goto", e)),
            Err(_) => Err(Error::Timeout(format!("loading {} took longer than {:?}", url, self.page_load_timeout))),
        }
    }

    async fn maximize_viewport(&mut self) -> Result<()> {
        self.client.maximize_window().await.map_err(|e| classify("maximize", e))
    }

    async fn find_element(&mut self, locator: &Locator) -> Result<Option<ElementHandle>> {
        let found = match locator {
            Locator::Css(selector) => self.client.find_all(fantoccini::Locator::Css(selector.as_str())).await,
            Locator::XPath(path) => self.client.find_all(fantoccini::Locator::XPath(path.as_str())).await,
        }
        .map_err(|e| classify(&format!("find {}", locator), e))?;

        let Some(element) = found.into_iter().next() else {
            return Ok(None);
        };
        let handle = ElementHandle(self.next_handle);
        self.next_handle += 1;
        self.elements.insert(handle.0, element);
        Ok(Some(handle))
    }

    async fn wait_until_clickable(&mut self, handle: ElementHandle, wait: Duration) -> Result<ElementHandle> {
        let deadline = Instant::now() + wait;
        let element = self.element(handle)?.clone();
        loop {
            if self.is_clickable(&element).await? {
                return Ok(handle);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!("element not clickable within {:?}", wait)));
            }
            sleep(CLICKABLE_POLL).await;
        }
    }

    async fn click(&mut self, handle: ElementHandle) -> Result<()> {
        let element = self.element(handle)?.clone();
        element.click().await.map_err(|e| classify("click", e))
    }

    async fn current_html(&mut self) -> Result<String> {
        self.client.source().await.map_err(|e| classify("page source", e))
    }

    async fn scroll_into_view(&mut self, handle: ElementHandle) -> Result<()> {
        let element = serde_json::to_value(self.element(handle)?)?;
        self.client
            .execute("arguments[0].scrollIntoView();", vec![element])
            .await
            .map_err(|e| classify("scroll", e))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.elements.clear();
        self.client.clone().close().await.map_err(|e| classify("close", e))
    }
}

/// Opens one isolated (incognito) browser session per page.
#[derive(Debug, Clone)]
pub struct WebDriverFactory {
    webdriver_url: String,
    headless: bool,
    page_load_timeout: Duration,
}

impl WebDriverFactory {
    pub fn new(webdriver_url: impl Into<String>, headless: bool, page_load_timeout: Duration) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless,
            page_load_timeout,
        }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(config.webdriver_url.clone(), config.headless, config.page_load_timeout())
    }

    fn chrome_args(&self) -> Vec<&'static str> {
        let mut args = vec!["--incognito"];
        if self.headless {
            args.extend(["--headless", "--disable-gpu", "--window-size=1920,1080"]);
        }
        args
    }
}

#[async_trait]
impl PageFactory for WebDriverFactory {
    async fn open(&self) -> Result<Box<dyn RenderablePage>> {
        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": self.chrome_args() }));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| Error::Browser(format!("Failed to connect to {}: {}", self.webdriver_url, e)))?;

        Ok(Box::new(WebDriverPage::new(client, self.page_load_timeout)))
    }
}
