use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::utils::error::DriverError;

/// What a bounded wait is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitCondition {
    /// The element exists in the DOM.
    Present,
    /// The element exists, is rendered and is not disabled.
    Clickable,
}

/// The browser capabilities the extraction pipeline relies on.
///
/// Selectors are CSS selectors. Operations on a selector act on the first
/// element in document order that matches it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Block until `selector` satisfies `condition` or `timeout` elapses.
    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Clear the input matched by `selector` and type `text` into it.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), DriverError>;

    async fn read_text(&self, selector: &str) -> Result<String, DriverError>;

    /// Values of `attribute` on every element matching `selector`, in
    /// document order. Elements without the attribute are skipped.
    async fn read_attributes(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<String>, DriverError>;

    /// Serialized DOM of the current page.
    async fn page_source(&self) -> Result<String, DriverError>;

    /// Terminate the session. Further calls may fail.
    async fn release(&self) -> Result<(), DriverError>;
}
