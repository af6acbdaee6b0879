// Integration tests for card-scraper
// These drive the real pipeline against a fake browser that serves HTML fixtures

pub mod pipeline_tests;
pub mod storage_tests;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use sqlx::sqlite::SqlitePoolOptions;

use card_scraper::browser::{BrowserSession, WaitCondition};
use card_scraper::core::Pause;
use card_scraper::storage::SqliteProductStore;
use card_scraper::{AppConfig, DriverError};

pub const ENTRY_URL: &str = "https://brain.com.ua/";
pub const SEARCH_TERM: &str = "Apple iPhone 15 128GB Black";
pub const IN_STOCK_HREF: &str = "/ua/Mobilniy_telefon_Apple_iPhone_15_128GB_Black.html";
pub const OUT_OF_STOCK_HREF: &str = "/ua/Mobilniy_telefon_Apple_iPhone_15_128GB_Black_refurb.html";

pub const HOME_PAGE: &str = include_str!("../fixtures/home.html");
pub const SEARCH_RESULTS_PAGE: &str = include_str!("../fixtures/search_results.html");
pub const PRODUCT_PAGE: &str = include_str!("../fixtures/product.html");

/// Skips every delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

#[async_trait]
impl Pause for NoPause {
    async fn pause(&self, _duration: Duration) {}
}

/// Pages served by [`FakeSession`], keyed by URL or link target.
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    search_results: Option<String>,
}

impl FakeSite {
    /// Home page, search results and the in-stock product page.
    pub fn retailer() -> Self {
        Self::default()
            .page(ENTRY_URL, HOME_PAGE)
            .search_results(SEARCH_RESULTS_PAGE)
            .page(IN_STOCK_HREF, PRODUCT_PAGE)
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn search_results(mut self, html: &str) -> Self {
        self.search_results = Some(html.to_string());
        self
    }
}

#[derive(Debug, Default)]
pub struct SessionLog {
    pub current: Option<String>,
    pub visited: Vec<String>,
    pub filled: Vec<String>,
    pub clicked: Vec<String>,
    pub scrolled: Vec<i64>,
    pub releases: usize,
}

/// Browser stand-in that answers selectors with `scraper` over fixture HTML.
///
/// Waits never block: an element is either in the current page or it is not.
#[derive(Debug, Clone)]
pub struct FakeSession {
    site: Arc<FakeSite>,
    log: Arc<Mutex<SessionLog>>,
}

impl FakeSession {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            log: Arc::new(Mutex::new(SessionLog::default())),
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, SessionLog> {
        self.log.lock().unwrap()
    }

    fn current(&self) -> Result<String, DriverError> {
        self.log()
            .current
            .clone()
            .ok_or_else(|| DriverError::Session("no page loaded".to_string()))
    }

    fn open(&self, key: &str) -> Result<(), DriverError> {
        let html = self.site.pages.get(key).cloned().ok_or_else(|| DriverError::Navigation {
            url: key.to_string(),
            message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        })?;
        let mut log = self.log();
        log.current = Some(html);
        log.visited.push(key.to_string());
        Ok(())
    }
}

/// What a click on the first match of a selector would do.
enum ClickTarget {
    Link(String),
    Submit,
    Other,
}

fn parse_selector(css: &str) -> Result<Selector, DriverError> {
    Selector::parse(css).map_err(|e| DriverError::Script(format!("bad selector {}: {}", css, e)))
}

fn first_match<T>(
    html: &str,
    css: &str,
    read: impl FnOnce(scraper::ElementRef<'_>) -> T,
) -> Result<Option<T>, DriverError> {
    let selector = parse_selector(css)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).next().map(read))
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.open(url)
    }

    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        let html = self.current()?;
        let enabled = first_match(&html, selector, |element| {
            element.value().attr("disabled").is_none()
        })?;

        match (enabled, condition) {
            (Some(_), WaitCondition::Present) | (Some(true), WaitCondition::Clickable) => Ok(()),
            (Some(false), WaitCondition::Clickable) => Err(DriverError::NotInteractable {
                selector: selector.to_string(),
                message: "element is disabled".to_string(),
            }),
            (None, _) => Err(DriverError::Timeout {
                selector: selector.to_string(),
                timeout,
            }),
        }
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let html = self.current()?;
        let target = first_match(&html, selector, |element| {
            let value = element.value();
            match (value.attr("href"), value.attr("type")) {
                (Some(href), _) => ClickTarget::Link(href.to_string()),
                (None, Some("submit")) => ClickTarget::Submit,
                _ => ClickTarget::Other,
            }
        })?
        .ok_or_else(|| DriverError::ElementNotFound {
            selector: selector.to_string(),
        })?;

        self.log().clicked.push(selector.to_string());
        match target {
            ClickTarget::Link(href) => self.open(&href),
            ClickTarget::Submit => {
                let results = self.site.search_results.clone().ok_or_else(|| {
                    DriverError::Navigation {
                        url: "search".to_string(),
                        message: "search is unavailable".to_string(),
                    }
                })?;
                let mut log = self.log();
                log.current = Some(results);
                log.visited.push("search".to_string());
                Ok(())
            }
            ClickTarget::Other => Ok(()),
        }
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let html = self.current()?;
        first_match(&html, selector, |_| ())?.ok_or_else(|| DriverError::ElementNotFound {
            selector: selector.to_string(),
        })?;
        self.log().filled.push(text.to_string());
        Ok(())
    }

    async fn scroll_by(&self, _dx: i64, dy: i64) -> Result<(), DriverError> {
        self.log().scrolled.push(dy);
        Ok(())
    }

    async fn read_text(&self, selector: &str) -> Result<String, DriverError> {
        let html = self.current()?;
        first_match(&html, selector, |element| element.text().collect::<String>())?.ok_or_else(
            || DriverError::ElementNotFound {
                selector: selector.to_string(),
            },
        )
    }

    async fn read_attributes(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<String>, DriverError> {
        let html = self.current()?;
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&html);
        Ok(document
            .select(&selector)
            .filter_map(|element| element.value().attr(attribute).map(str::to_string))
            .collect())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        self.current()
    }

    async fn release(&self) -> Result<(), DriverError> {
        self.log().releases += 1;
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::default()
}

/// In-memory store; one connection so every query sees the same database.
pub async fn memory_store() -> anyhow::Result<SqliteProductStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(SqliteProductStore::from_pool(pool).await?)
}
