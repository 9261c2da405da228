use std::cell::RefCell;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::scrapers::page::PageModel;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Page capability the extractors consume.
///
/// Implementations are blocking; scrapers run them on a blocking thread.
pub trait PageDriver {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Current page HTML
    fn content(&self) -> Result<String, ScrapeError>;

    /// Number of elements matching `selector` (0 when none)
    fn count(&self, selector: &str) -> Result<usize, ScrapeError>;

    /// Click the `index`-th element matching `selector`
    fn click(&self, selector: &str, index: usize) -> Result<(), ScrapeError>;

    /// Inner text of the first element matching `selector`
    fn text(&self, selector: &str) -> Result<String, ScrapeError>;

    fn pause(&self, duration: Duration) {
        thread::sleep(duration);
    }

    fn snapshot(&self) -> Result<PageModel, ScrapeError> {
        Ok(PageModel::parse(&self.content()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverKind {
    /// Headless Chrome, renders JavaScript
    #[default]
    Chrome,
    /// Plain HTTP GET, no JavaScript and no interactions
    Http,
}

impl FromStr for DriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" | "browser" => Ok(DriverKind::Chrome),
            "http" => Ok(DriverKind::Http),
            other => Err(format!("unknown driver '{}', expected chrome or http", other)),
        }
    }
}

/// How each site session is opened and paced
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub driver: DriverKind,
    pub headless: bool,
    pub nav_timeout: Duration,
    /// Wait after navigation for client-side rendering
    pub settle_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            driver: DriverKind::Chrome,
            headless: true,
            nav_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(3),
        }
    }
}

/// Open a session owned by one site scrape; dropping it releases the browser
pub fn open_session(settings: &SessionSettings, label: &str) -> Result<Box<dyn PageDriver>, ScrapeError> {
    match settings.driver {
        DriverKind::Chrome => Ok(Box::new(ChromeSession::launch(label, settings)?)),
        DriverKind::Http => Ok(Box::new(HttpSession::new(label)?)),
    }
}

/// Poll until one of `selectors` matches, returning the first that did
pub fn wait_for_any<'a>(driver: &dyn PageDriver, selectors: &[&'a str], timeout: Duration) -> Option<&'a str> {
    let poll = Duration::from_millis(500);
    let mut waited = Duration::ZERO;

    loop {
        if let Some(found) = selectors
            .iter()
            .find(|css| driver.count(css).unwrap_or(0) > 0)
        {
            debug!("Found content with selector '{}'", found);
            return Some(*found);
        }
        if waited >= timeout {
            return None;
        }
        driver.pause(poll);
        waited += poll;
    }
}

fn browser_error(e: anyhow::Error) -> ScrapeError {
    ScrapeError::Browser(format!("{:#}", e))
}

fn interaction_error(selector: &str, e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Interaction {
        selector: selector.to_string(),
        reason: e.to_string(),
    }
}

/// Browser-backed session using headless Chrome
pub struct ChromeSession {
    // Held so the Chrome process lives as long as the tab
    _browser: Browser,
    tab: Arc<Tab>,
    label: String,
}

impl ChromeSession {
    pub fn launch(label: &str, settings: &SessionSettings) -> Result<Self, ScrapeError> {
        info!("🚀 Launching {} browser...", label);

        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .idle_browser_timeout(settings.nav_timeout * 4)
            .build()
            .map_err(|e| ScrapeError::Browser(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(options).map_err(browser_error)?;
        let tab = browser.new_tab().map_err(browser_error)?;
        tab.set_default_timeout(settings.nav_timeout);
        tab.set_user_agent(USER_AGENT, None, None).map_err(browser_error)?;

        Ok(Self {
            _browser: browser,
            tab,
            label: label.to_string(),
        })
    }
}

impl PageDriver for ChromeSession {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        info!("📍 Navigating to {}", url);
        self.tab.set_default_timeout(timeout);
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: format!("{:#}", e),
            })?;
        Ok(())
    }

    fn content(&self) -> Result<String, ScrapeError> {
        let html = self.tab.get_content().map_err(browser_error)?;
        debug!("Captured {} bytes of HTML", html.len());
        Ok(html)
    }

    fn count(&self, selector: &str) -> Result<usize, ScrapeError> {
        // find_elements errors when nothing matches
        Ok(self.tab.find_elements(selector).map(|found| found.len()).unwrap_or(0))
    }

    fn click(&self, selector: &str, index: usize) -> Result<(), ScrapeError> {
        let elements = self
            .tab
            .find_elements(selector)
            .map_err(|e| interaction_error(selector, format!("{:#}", e)))?;
        let element = elements
            .get(index)
            .ok_or_else(|| interaction_error(selector, format!("no element at index {}", index)))?;
        element
            .click()
            .map_err(|e| interaction_error(selector, format!("{:#}", e)))?;
        Ok(())
    }

    fn text(&self, selector: &str) -> Result<String, ScrapeError> {
        self.tab
            .find_element(selector)
            .and_then(|element| element.get_inner_text())
            .map_err(|e| interaction_error(selector, format!("{:#}", e)))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            warn!("Failed to close {} tab: {:#}", self.label, e);
        }
        info!("🔒 {} browser closed", self.label);
    }
}

/// Plain HTTP session for server-rendered pages
pub struct HttpSession {
    client: Client,
    body: RefCell<String>,
    label: String,
}

impl HttpSession {
    pub fn new(label: &str) -> Result<Self, ScrapeError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            body: RefCell::new(String::new()),
            label: label.to_string(),
        })
    }
}

impl PageDriver for HttpSession {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        info!("📍 Fetching {} for {}", url, self.label);
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let body = response.text()?;
        debug!("Downloaded {} bytes of HTML", body.len());
        *self.body.borrow_mut() = body;
        Ok(())
    }

    fn content(&self) -> Result<String, ScrapeError> {
        Ok(self.body.borrow().clone())
    }

    fn count(&self, selector: &str) -> Result<usize, ScrapeError> {
        Ok(self.snapshot()?.query(selector).len())
    }

    fn click(&self, _selector: &str, _index: usize) -> Result<(), ScrapeError> {
        Err(ScrapeError::Unsupported {
            operation: "click",
            driver: "http",
        })
    }

    fn text(&self, selector: &str) -> Result<String, ScrapeError> {
        self.snapshot()?
            .query(selector)
            .first()
            .map(|element| crate::scrapers::page::element_text(*element))
            .ok_or_else(|| interaction_error(selector, "no matching element"))
    }

    fn pause(&self, _duration: Duration) {}
}
