//! Scripted in-memory page for exercising drivers and the manager without a
//! browser.

use async_trait::async_trait;
use hl_core::{ElementHandle, Error, Locator, PageFactory, RenderablePage, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const CONSENT: ElementHandle = ElementHandle(1);
const LOAD_MORE: ElementHandle = ElementHandle(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Intercepted,
    Timeout,
    Fatal,
}

impl ScriptedFailure {
    fn into_error(self, what: &str) -> Error {
        match self {
            ScriptedFailure::Intercepted => Error::ClickIntercepted(format!("{} covered by overlay", what)),
            ScriptedFailure::Timeout => Error::Timeout(format!("{} not ready", what)),
            ScriptedFailure::Fatal => Error::Browser(format!("session lost during {}", what)),
        }
    }
}

/// Everything a test may want to look at after the run.
#[derive(Debug, Default, Clone)]
pub struct ScriptState {
    /// HTML of each listing page; the first one is rendered on load.
    pub pages: Vec<String>,
    /// Locator of the load-more control. Any other locator finds nothing
    /// unless it is the consent locator.
    pub load_more: Option<Locator>,
    pub revealed: usize,
    pub loaded_url: Option<String>,
    pub maximized: bool,
    /// Locator of the consent button, if the page shows one.
    pub consent: Option<Locator>,
    pub consent_clicked: bool,
    pub consent_failure: Option<ScriptedFailure>,
    /// Successful load-more clicks.
    pub clicks: usize,
    /// Load-more click attempts, successful or not.
    pub attempts: usize,
    pub scrolls: usize,
    pub clickable_waits: Vec<Duration>,
    /// Keyed by 1-based load-more attempt.
    pub click_failures: HashMap<usize, ScriptedFailure>,
    pub load_failure: Option<ScriptedFailure>,
    /// Reads of the page HTML, successful or not.
    pub html_reads: usize,
    /// Keyed by 1-based HTML read.
    pub html_failures: HashMap<usize, ScriptedFailure>,
    pub closed: bool,
}

impl ScriptState {
    pub fn html(&self) -> String {
        format!("<html><body>{}</body></html>", self.pages[..self.revealed].join("\n"))
    }
}

/// A [`RenderablePage`] whose DOM is a list of canned listing pages.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedPage {
    /// A page whose load-more control is found through `load_more`.
    pub fn new<S: Into<String>>(load_more: Locator, pages: impl IntoIterator<Item = S>) -> Self {
        let state = ScriptState {
            pages: pages.into_iter().map(Into::into).collect(),
            load_more: Some(load_more),
            ..ScriptState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_consent(self, locator: Locator) -> Self {
        self.lock().consent = Some(locator);
        self
    }

    /// Make the click on the consent button fail.
    pub fn fail_consent(self, failure: ScriptedFailure) -> Self {
        self.lock().consent_failure = Some(failure);
        self
    }

    /// Make the `read`-th HTML read (1-based) fail.
    pub fn fail_html(self, read: usize, failure: ScriptedFailure) -> Self {
        self.lock().html_failures.insert(read, failure);
        self
    }

    /// Make the `attempt`-th load-more click (1-based) fail.
    pub fn fail_click(self, attempt: usize, failure: ScriptedFailure) -> Self {
        self.lock().click_failures.insert(attempt, failure);
        self
    }

    pub fn fail_load(self, failure: ScriptedFailure) -> Self {
        self.lock().load_failure = Some(failure);
        self
    }

    pub fn state(&self) -> ScriptState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RenderablePage for ScriptedPage {
    async fn load_url(&mut self, url: &str) -> Result<()> {
        let mut state = self.lock();
        if let Some(failure) = state.load_failure {
            return Err(failure.into_error("page load"));
        }
        state.loaded_url = Some(url.to_string());
        state.revealed = state.pages.len().min(1);
        Ok(())
    }

    async fn maximize_viewport(&mut self) -> Result<()> {
        self.lock().maximized = true;
        Ok(())
    }

    async fn find_element(&mut self, locator: &Locator) -> Result<Option<ElementHandle>> {
        let state = self.lock();
        if state.consent.as_ref() == Some(locator) {
            return Ok((!state.consent_clicked).then_some(CONSENT));
        }
        if state.load_more.as_ref() != Some(locator) {
            return Ok(None);
        }
        Ok((state.revealed < state.pages.len()).then_some(LOAD_MORE))
    }

    async fn wait_until_clickable(&mut self, handle: ElementHandle, timeout: Duration) -> Result<ElementHandle> {
        self.lock().clickable_waits.push(timeout);
        Ok(handle)
    }

    async fn click(&mut self, handle: ElementHandle) -> Result<()> {
        let mut state = self.lock();
        if handle == CONSENT {
            if let Some(failure) = state.consent_failure {
                return Err(failure.into_error("consent"));
            }
            state.consent_clicked = true;
            return Ok(());
        }
        state.attempts += 1;
        if let Some(failure) = state.click_failures.get(&state.attempts).copied() {
            return Err(failure.into_error("load more"));
        }
        state.clicks += 1;
        state.revealed = (state.revealed + 1).min(state.pages.len());
        Ok(())
    }

    async fn current_html(&mut self) -> Result<String> {
        let mut state = self.lock();
        state.html_reads += 1;
        if let Some(failure) = state.html_failures.get(&state.html_reads).copied() {
            return Err(failure.into_error("page source"));
        }
        Ok(state.html())
    }

    async fn scroll_into_view(&mut self, _handle: ElementHandle) -> Result<()> {
        self.lock().scrolls += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.lock().closed = true;
        Ok(())
    }
}

/// Hands out [`ScriptedPage`]s built by `build`, remembering each one.
pub struct ScriptedPageFactory {
    build: Box<dyn Fn() -> ScriptedPage + Send + Sync>,
    opened: Mutex<Vec<ScriptedPage>>,
}

impl ScriptedPageFactory {
    pub fn new(build: impl Fn() -> ScriptedPage + Send + Sync + 'static) -> Self {
        Self {
            build: Box::new(build),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn opened(&self) -> Vec<ScriptedPage> {
        self.opened.lock().map(|pages| pages.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageFactory for ScriptedPageFactory {
    async fn open(&self) -> Result<Box<dyn RenderablePage>> {
        let page = (self.build)();
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(page.clone());
        }
        Ok(Box::new(page))
    }
}
