use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use crate::browser::{BrowserSession, WaitCondition};
use crate::config::{ScrollStep, SpecificationConfig};
use crate::core::retry::{Pause, RetryExecutor};
use crate::models::{SpecificationSection, SpecificationTree};
use crate::utils::error::{AppError, Result};

/// Compiled selectors for the characteristics markup.
#[derive(Debug, Clone)]
pub struct SpecificationSelectors {
    pub block: Selector,
    pub item: Selector,
    pub header: Selector,
    pub row: Selector,
    pub fragment: Selector,
    pub link: Selector,
}

impl SpecificationSelectors {
    pub fn compile(config: &SpecificationConfig) -> Result<Self> {
        Ok(Self {
            block: compile(&config.block)?,
            item: compile(&config.item)?,
            header: compile(&config.header)?,
            row: compile(&config.row)?,
            fragment: compile(&config.fragment)?,
            link: compile(&config.link)?,
        })
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn normalized_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Split one characteristics row into an attribute name and its value.
///
/// The first fragment is the name and the rest make up the value. Anchors
/// inside a fragment replace that fragment's own text. Rows with fewer than
/// two fragments give `(None, None)`; a row whose fragments are all blank
/// gives a name with a `None` value.
pub fn parse_specification_row(
    row: ElementRef<'_>,
    selectors: &SpecificationSelectors,
) -> (Option<String>, Option<String>) {
    let fragments: Vec<ElementRef<'_>> = row.select(&selectors.fragment).collect();
    if fragments.len() < 2 {
        return (None, None);
    }

    let name = Some(normalized_text(fragments[0])).filter(|name| !name.is_empty());

    let mut parts = Vec::new();
    for fragment in &fragments[1..] {
        let links: Vec<String> = fragment.select(&selectors.link).map(normalized_text).collect();
        if links.is_empty() {
            parts.push(normalized_text(*fragment));
        } else {
            parts.extend(links);
        }
    }
    parts.retain(|part| !part.is_empty());

    let value = if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    };

    (name, value)
}

/// Build the tree from a page snapshot.
///
/// A header seen twice replaces the earlier section's rows; the section
/// stays where it first appeared.
pub fn parse_specification_tree(html: &str, selectors: &SpecificationSelectors) -> SpecificationTree {
    let document = Html::parse_document(html);
    let mut tree = SpecificationTree::new();

    for block in document.select(&selectors.block) {
        for item in block.select(&selectors.item) {
            let header = item
                .select(&selectors.header)
                .next()
                .map(normalized_text)
                .filter(|header| !header.is_empty());

            let Some(header) = header else {
                tracing::warn!("Skipping characteristics item without a header");
                continue;
            };

            let mut section = SpecificationSection::new();
            for row in item.select(&selectors.row) {
                match parse_specification_row(row, selectors) {
                    (Some(name), value) => section.insert(name, value),
                    (None, _) => continue,
                }
            }

            if tree.section(&header).is_some() {
                tracing::debug!("Section '{}' seen again, replacing earlier rows", header);
            }
            tree.insert_section(header, section);
        }
    }

    tree
}

/// Reveals the characteristics block on a product page and reads it.
pub struct SpecificationParser<'a, S: ?Sized, P> {
    session: &'a S,
    retry: &'a RetryExecutor<P>,
    config: &'a SpecificationConfig,
    selectors: SpecificationSelectors,
}

impl<'a, S, P> SpecificationParser<'a, S, P>
where
    S: BrowserSession + ?Sized,
    P: Pause,
{
    /// Fails when a configured selector does not parse.
    pub fn new(
        session: &'a S,
        retry: &'a RetryExecutor<P>,
        config: &'a SpecificationConfig,
    ) -> Result<Self> {
        Ok(Self {
            session,
            retry,
            config,
            selectors: SpecificationSelectors::compile(config)?,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.wait_timeout_secs)
    }

    async fn scroll(&self, step: ScrollStep) {
        let reveal = &self.config.reveal;
        match self.session.scroll_by(0, step.distance).await {
            Ok(()) => {
                tracing::info!("Scrolled by {}", step.distance);
                self.retry.settle(&reveal.pause).await;
            }
            Err(e) => {
                tracing::warn!("Scroll by {} failed ({}), trying {}", step.distance, e, step.fallback_distance);
                if let Err(e) = self.session.scroll_by(0, step.fallback_distance).await {
                    tracing::warn!("Fallback scroll failed: {}", e);
                }
                self.retry.settle(&reveal.fallback_pause).await;
            }
        }
    }

    async fn expand(&self) {
        let button = self.config.expand_button.as_str();
        let clicked = match self
            .session
            .wait_for(button, WaitCondition::Clickable, self.timeout())
            .await
        {
            Ok(()) => self.session.click(button).await,
            Err(e) => Err(e),
        };

        match clicked {
            Ok(()) => {
                tracing::info!("Expanded all characteristics");
                self.retry.settle(&self.config.reveal.pause).await;
            }
            Err(e) => tracing::warn!("Could not expand characteristics: {}", e),
        }
    }

    /// Scroll, expand and scroll again so the full block is rendered.
    /// Nothing here fails the run.
    pub async fn reveal(&self) {
        self.scroll(self.config.reveal.before_expand).await;
        self.expand().await;
        self.scroll(self.config.reveal.after_expand).await;
    }

    /// Reveal the block and parse it. An absent block or an unreadable page
    /// gives an empty tree.
    pub async fn collect(&self) -> SpecificationTree {
        self.reveal().await;

        if let Err(e) = self
            .session
            .wait_for(&self.config.block, WaitCondition::Present, self.timeout())
            .await
        {
            tracing::warn!("No characteristics found: {}", e);
            return SpecificationTree::new();
        }

        let html = match self.session.page_source().await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Could not read page source for characteristics: {}", e);
                return SpecificationTree::new();
            }
        };

        let tree = parse_specification_tree(&html, &self.selectors);
        tracing::info!("Collected {} characteristic sections", tree.len());
        tree
    }
}
