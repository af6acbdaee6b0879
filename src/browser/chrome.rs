use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};

use super::session::{BrowserSession, WaitCondition};
use crate::config::BrowserConfig;
use crate::utils::error::DriverError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

// Returns true when the element is rendered and not disabled.
const IS_CLICKABLE_JS: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden'
        && style.display !== 'none'
        && !this.disabled;
}"#;

const CLEAR_INPUT_JS: &str = r#"function() {
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
}"#;

/// A single Chrome instance driving a single tab.
pub struct ChromeSession {
    browser: Mutex<Option<Browser>>,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(config: &BrowserConfig) -> Result<Self, DriverError> {
        let window_size = format!("--window-size={},{}", config.window_width, config.window_height);
        let lang = format!("--lang={}", config.language);
        let mut args = vec![
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-popup-blocking"),
            OsStr::new("--disable-notifications"),
            OsStr::new("--no-first-run"),
            OsStr::new("--no-default-browser-check"),
            OsStr::new(window_size.as_str()),
            OsStr::new(lang.as_str()),
        ];
        if !config.sandbox {
            args.push(OsStr::new("--no-sandbox"));
        }

        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(config.sandbox)
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(Duration::from_secs(config.idle_timeout_secs))
            .args(args)
            .build()
            .map_err(|e| DriverError::Session(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| DriverError::Session(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| DriverError::Session(format!("Failed to create tab: {}", e)))?;

        if let Some(user_agent) = &config.user_agent {
            tab.set_user_agent(user_agent, Some(&config.language), None)
                .map_err(|e| DriverError::Session(format!("Failed to set user agent: {}", e)))?;
        }

        tracing::info!("Chrome session started (headless: {})", config.headless);

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            tab,
        })
    }

    fn find(&self, selector: &str) -> Result<Element<'_>, DriverError> {
        self.tab
            .find_element(selector)
            .map_err(|_| DriverError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    fn is_clickable(element: &Element<'_>) -> bool {
        element
            .call_js_fn(IS_CLICKABLE_JS, vec![], false)
            .ok()
            .and_then(|object| object.value)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }
}

/// Poll `check` until it reports a clickable element or `timeout` elapses.
///
/// `check` yields `None` while the element is absent and `Some(clickable)`
/// once it is in the DOM.
async fn poll_clickable<F>(selector: &str, timeout: Duration, mut check: F) -> Result<(), DriverError>
where
    F: FnMut() -> Option<bool>,
{
    let deadline = Instant::now() + timeout;
    let mut last_seen = false;

    loop {
        match check() {
            Some(true) => return Ok(()),
            Some(false) => last_seen = true,
            None => {}
        }
        if Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    if last_seen {
        Err(DriverError::NotInteractable {
            selector: selector.to_string(),
            message: format!("not clickable within {:?}", timeout),
        })
    } else {
        Err(DriverError::Timeout {
            selector: selector.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|e| DriverError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        match condition {
            WaitCondition::Present => self
                .tab
                .wait_for_element_with_custom_timeout(selector, timeout)
                .map(|_| ())
                .map_err(|_| DriverError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                }),
            WaitCondition::Clickable => {
                poll_clickable(selector, timeout, || {
                    self.tab
                        .find_element(selector)
                        .ok()
                        .map(|element| Self::is_clickable(&element))
                })
                .await
            }
        }
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let element = self.find(selector)?;
        element
            .scroll_into_view()
            .and_then(|element| element.click())
            .map(|_| ())
            .map_err(|e| DriverError::NotInteractable {
                selector: selector.to_string(),
                message: e.to_string(),
            })
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let element = self.find(selector)?;
        element
            .call_js_fn(CLEAR_INPUT_JS, vec![], false)
            .map_err(|e| DriverError::Script(format!("Failed to clear {}: {}", selector, e)))?;
        element
            .click()
            .and_then(|element| element.type_into(text))
            .map(|_| ())
            .map_err(|e| DriverError::NotInteractable {
                selector: selector.to_string(),
                message: e.to_string(),
            })
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), DriverError> {
        self.tab
            .evaluate(&format!("window.scrollBy({}, {})", dx, dy), false)
            .map(|_| ())
            .map_err(|e| DriverError::Script(format!("Scroll by ({}, {}) failed: {}", dx, dy, e)))
    }

    async fn read_text(&self, selector: &str) -> Result<String, DriverError> {
        self.find(selector)?
            .get_inner_text()
            .map_err(|e| DriverError::Script(format!("Failed to read text of {}: {}", selector, e)))
    }

    async fn read_attributes(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Vec<String>, DriverError> {
        let elements = self
            .tab
            .find_elements(selector)
            .map_err(|_| DriverError::ElementNotFound {
                selector: selector.to_string(),
            })?;

        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            match element.get_attribute_value(attribute) {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping {} attribute of {}: {}", attribute, selector, e),
            }
        }
        Ok(values)
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        self.tab
            .get_content()
            .map_err(|e| DriverError::Script(format!("Failed to get page content: {}", e)))
    }

    async fn release(&self) -> Result<(), DriverError> {
        if let Err(e) = self.tab.close(true) {
            tracing::warn!("Failed to close tab: {}", e);
        }
        let browser = self
            .browser
            .lock()
            .map_err(|_| DriverError::Session("browser handle poisoned".to_string()))?
            .take();

        match browser {
            // Dropping the Browser kills the Chrome process.
            Some(browser) => {
                drop(browser);
                tracing::info!("Chrome session closed");
            }
            None => tracing::warn!("Chrome session already released"),
        }
        Ok(())
    }
}
