use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::browser::{BrowserSession, WaitCondition};
use crate::config::ExtractionConfig;
use crate::models::ProductFields;

static PRICE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9.,]").expect("price filter pattern is valid"));

/// Turn price text such as `"29 999,00 ₴"` into a number.
///
/// Only digits and `.`/`,` survive; a comma is read as a decimal point and,
/// when several points remain, all but the last are thousands separators.
/// Text without digits, or that still fails to parse, yields `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let flattened = raw.replace(['\n', '\r'], "");
    let cleaned = PRICE_NOISE.replace_all(&flattened, "");
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = cleaned.replace(',', ".");
    let normalized = match normalized.rfind('.') {
        Some(last) if normalized[..last].contains('.') => {
            let (whole, fraction) = normalized.split_at(last);
            format!("{}{}", whole.replace('.', ""), fraction)
        }
        _ => normalized,
    };

    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn parse_review_count(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Reads the independent product fields.
///
/// Each field gets one bounded wait and no retries. A field that does not
/// show up in time is logged and left empty; the others are still read.
pub struct FieldExtractor<'a, S: ?Sized> {
    session: &'a S,
    config: &'a ExtractionConfig,
}

impl<'a, S> FieldExtractor<'a, S>
where
    S: BrowserSession + ?Sized,
{
    pub fn new(session: &'a S, config: &'a ExtractionConfig) -> Self {
        Self { session, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.field_timeout_secs)
    }

    async fn present(&self, field: &str, selector: &str) -> bool {
        match self
            .session
            .wait_for(selector, WaitCondition::Present, self.timeout())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{} not found: {}", field, e);
                false
            }
        }
    }

    async fn text(&self, field: &str, selector: &str) -> Option<String> {
        if !self.present(field, selector).await {
            return None;
        }
        match self.session.read_text(selector).await {
            Ok(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", field, e);
                None
            }
        }
    }

    pub async fn title(&self) -> Option<String> {
        let title = self.text("Product title", &self.config.selectors.title).await;
        if let Some(title) = &title {
            tracing::info!("Product title found: {}", title);
        }
        title
    }

    pub async fn regular_price(&self) -> Option<f64> {
        let raw = self.text("Price", &self.config.selectors.price).await?;
        let price = parse_price(&raw);
        match price {
            Some(price) => tracing::info!("Price found: {}", price),
            None => tracing::warn!("Price text not numeric: {:?}", raw),
        }
        price
    }

    /// The product page exposes no separate sale price element.
    pub fn sale_price(&self) -> Option<f64> {
        None
    }

    pub async fn photos(&self) -> Vec<String> {
        let selector = &self.config.selectors.photos;
        if !self.present("Photos", selector).await {
            return Vec::new();
        }

        match self.session.read_attributes(selector, "src").await {
            Ok(sources) => {
                let photos: Vec<String> = sources
                    .into_iter()
                    .map(|src| src.trim().to_string())
                    .filter(|src| !src.is_empty())
                    .collect();
                tracing::info!("Added {} photos", photos.len());
                photos
            }
            Err(e) => {
                tracing::warn!("Could not read photo sources: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn review_count(&self) -> Option<i64> {
        let raw = self
            .text("Review count", &self.config.selectors.review_count)
            .await?;
        let count = parse_review_count(&raw);
        match count {
            Some(count) => tracing::info!("Review count found: {}", count),
            None => tracing::warn!("Review count not numeric: {:?}", raw),
        }
        count
    }

    pub async fn code(&self) -> Option<String> {
        let code = self.text("Product code", &self.config.selectors.code).await;
        if let Some(code) = &code {
            tracing::info!("Product code found: {}", code);
        }
        code
    }

    pub async fn extract(&self) -> ProductFields {
        tracing::info!("Collecting product fields");
        ProductFields {
            title: self.title().await,
            regular_price: self.regular_price().await,
            sale_price: self.sale_price(),
            photos: self.photos().await,
            review_count: self.review_count().await,
            code: self.code().await,
        }
    }
}
