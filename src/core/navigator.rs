use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::{BrowserSession, WaitCondition};
use crate::config::NavigationConfig;
use crate::core::retry::{Pause, RetryExecutor};
use crate::utils::error::{AppError, DriverError, Result};

/// Where the navigator is. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PageState {
    Home,
    SearchResults,
    ProductPage,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageState::Home => "Home",
            PageState::SearchResults => "SearchResults",
            PageState::ProductPage => "ProductPage",
        };
        f.write_str(name)
    }
}

/// Drives the session from the entry page to a product page.
pub struct PageNavigator<'a, S: ?Sized, P> {
    session: &'a S,
    retry: &'a RetryExecutor<P>,
    config: &'a NavigationConfig,
    state: Option<PageState>,
}

impl<'a, S, P> PageNavigator<'a, S, P>
where
    S: BrowserSession + ?Sized,
    P: Pause,
{
    pub fn new(session: &'a S, retry: &'a RetryExecutor<P>, config: &'a NavigationConfig) -> Self {
        Self {
            session,
            retry,
            config,
            state: None,
        }
    }

    pub fn state(&self) -> Option<PageState> {
        self.state
    }

    fn interaction_timeout(&self) -> Duration {
        Duration::from_secs(self.config.interaction_timeout_secs)
    }

    fn require(&self, expected: Option<PageState>, to: PageState) -> Result<()> {
        if self.state == expected {
            return Ok(());
        }
        Err(AppError::InvalidTransition {
            from: self
                .state
                .map(|state| state.to_string())
                .unwrap_or_else(|| "start".to_string()),
            to,
        })
    }

    /// Load the entry page.
    pub async fn navigate_home(&mut self, url: &str) -> Result<()> {
        self.require(None, PageState::Home)?;
        let session = self.session;

        self.retry
            .run(url, &self.config.home, move |attempt| async move {
                session.navigate(url).await?;
                tracing::info!("Navigated to {} on attempt {}", url, attempt);
                Ok::<(), DriverError>(())
            })
            .await?;

        self.state = Some(PageState::Home);
        Ok(())
    }

    /// Type `term` into the search box and submit it.
    pub async fn search(&mut self, term: &str) -> Result<()> {
        self.require(Some(PageState::Home), PageState::SearchResults)?;
        let session = self.session;
        let retry = self.retry;
        let timeout = self.interaction_timeout();
        let selectors = &self.config.selectors;
        let typing_pause = &self.config.typing_pause;
        let target = format!("search for '{}'", term);

        self.retry
            .run(&target, &self.config.search, move |attempt| async move {
                let input = selectors.search_input.as_str();
                let submit = selectors.search_submit.as_str();

                session.wait_for(input, WaitCondition::Clickable, timeout).await?;
                session.fill(input, term).await?;
                tracing::info!("Searching for product: {} (attempt {})", term, attempt);
                retry.settle(typing_pause).await;

                session.wait_for(submit, WaitCondition::Clickable, timeout).await?;
                session.click(submit).await?;
                tracing::info!("Search submitted on attempt {}", attempt);
                Ok::<(), DriverError>(())
            })
            .await?;

        self.state = Some(PageState::SearchResults);
        Ok(())
    }

    /// Open the first in-stock search result.
    ///
    /// The configured selector filters by stock flag, so an out-of-stock
    /// result earlier in the listing is never picked.
    pub async fn open_first_result(&mut self) -> Result<()> {
        self.require(Some(PageState::SearchResults), PageState::ProductPage)?;
        let session = self.session;
        let timeout = self.interaction_timeout();
        let selector = self.config.selectors.first_in_stock_result.as_str();

        self.retry
            .run(selector, &self.config.open_result, move |attempt| async move {
                session.wait_for(selector, WaitCondition::Clickable, timeout).await?;
                session.click(selector).await?;
                tracing::info!("Opened first in-stock result on attempt {}", attempt);
                Ok::<(), DriverError>(())
            })
            .await?;

        self.state = Some(PageState::ProductPage);
        Ok(())
    }
}
