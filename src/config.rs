use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

use crate::core::canonical::{CanonicalField, CanonicalPath};
use crate::core::retry::{BackoffRange, RetryPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target: TargetConfig,
    pub browser: BrowserConfig,
    pub navigation: NavigationConfig,
    pub extraction: ExtractionConfig,
    pub specifications: SpecificationConfig,
    pub canonical: CanonicalConfig,
    pub database: DatabaseConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub entry_url: String,
    pub search_term: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub sandbox: bool,
    pub chrome_path: Option<String>,
    pub user_agent: Option<String>,
    pub language: String,
    pub window_width: u32,
    pub window_height: u32,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub home: RetryPolicy,
    pub search: RetryPolicy,
    pub open_result: RetryPolicy,
    /// Bounded wait for a control to become actionable.
    pub interaction_timeout_secs: u64,
    /// Pause between typing the search term and submitting.
    pub typing_pause: BackoffRange,
    pub selectors: NavigationSelectors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationSelectors {
    pub search_input: String,
    pub search_submit: String,
    /// Must filter by stock flag itself; the first match is opened.
    pub first_in_stock_result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub field_timeout_secs: u64,
    pub selectors: FieldSelectors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSelectors {
    pub title: String,
    pub price: String,
    pub photos: String,
    pub review_count: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecificationConfig {
    pub block: String,
    pub item: String,
    pub header: String,
    pub row: String,
    pub fragment: String,
    pub link: String,
    pub expand_button: String,
    pub wait_timeout_secs: u64,
    pub reveal: RevealConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    pub before_expand: ScrollStep,
    pub after_expand: ScrollStep,
    /// Pause after a scroll or click that worked.
    pub pause: BackoffRange,
    /// Pause after a fallback scroll.
    pub fallback_pause: BackoffRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScrollStep {
    pub distance: i64,
    pub fallback_distance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalConfig {
    pub paths: Vec<CanonicalPath>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
    /// Used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            entry_url: "https://brain.com.ua/".to_string(),
            search_term: "Apple iPhone 15 128GB Black".to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chrome_path: None,
            user_agent: None,
            language: "uk-UA".to_string(),
            window_width: 1920,
            window_height: 1080,
            idle_timeout_secs: 120,
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            home: RetryPolicy::navigation(),
            search: RetryPolicy::interaction(),
            open_result: RetryPolicy::selection(),
            interaction_timeout_secs: 10,
            typing_pause: BackoffRange::new(1.0, 3.0),
            selectors: NavigationSelectors::default(),
        }
    }
}

impl Default for NavigationSelectors {
    fn default() -> Self {
        Self {
            search_input: "div[class*='header-bottom-in'] input.quick-search-input".to_string(),
            search_submit: "input.qsr-submit[type='submit'][value='Знайти']".to_string(),
            first_in_stock_result: "div[data-stock='1'] a".to_string(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            field_timeout_secs: 10,
            selectors: FieldSelectors::default(),
        }
    }
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            title: "div.main-right-block h1.desktop-only-title".to_string(),
            price: "div.br-pr-price.main-price-block div.price-wrapper".to_string(),
            photos: "div.product-block-right div.slick-track img".to_string(),
            review_count: "div.title a.forbid-click.reviews-count span".to_string(),
            code: "div.title span.br-pr-code-val".to_string(),
        }
    }
}

impl Default for SpecificationConfig {
    fn default() -> Self {
        Self {
            block: "div.br-wrap-block.br-elem-block".to_string(),
            item: "div.br-pr-chr-item".to_string(),
            header: "h3".to_string(),
            row: "div".to_string(),
            fragment: "span".to_string(),
            link: "a".to_string(),
            expand_button: "div#br-characteristics button.br-prs-button".to_string(),
            wait_timeout_secs: 10,
            reveal: RevealConfig::default(),
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            before_expand: ScrollStep {
                distance: 700,
                fallback_distance: 1000,
            },
            after_expand: ScrollStep {
                distance: 1000,
                fallback_distance: 1500,
            },
            pause: BackoffRange::new(2.0, 5.0),
            fallback_pause: BackoffRange::new(1.0, 4.0),
        }
    }
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            paths: vec![
                CanonicalPath::new(CanonicalField::Manufacturer, "Інші", "Виробник"),
                CanonicalPath::new(CanonicalField::Memory, "Функції пам'яті", "Вбудована пам'ять"),
                CanonicalPath::new(CanonicalField::Color, "Фізичні характеристики", "Колір"),
                CanonicalPath::new(CanonicalField::ScreenDiagonal, "Дисплей", "Діагональ екрану"),
                CanonicalPath::new(
                    CanonicalField::ScreenResolution,
                    "Дисплей",
                    "Роздільна здатність екрану",
                ),
            ],
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/products.db?mode=rwc".to_string(),
            max_connections: 1,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("results/products.csv"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "parser.log".to_string(),
            default_filter: "card_scraper=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Layer built-in defaults, an optional TOML file and `CARD_SCRAPER__*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&AppConfig::default())?;

        let mut builder = Config::builder().add_source(defaults);
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("config/default").required(false)),
        };

        let s = builder
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("CARD_SCRAPER").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.target.entry_url).is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid entry URL: {}",
                self.target.entry_url
            )));
        }

        if self.target.search_term.trim().is_empty() {
            return Err(ConfigError::Message("Search term must not be empty".into()));
        }

        for (name, policy) in [
            ("home", &self.navigation.home),
            ("search", &self.navigation.search),
            ("open_result", &self.navigation.open_result),
        ] {
            if policy.max_attempts == 0 {
                return Err(ConfigError::Message(format!(
                    "navigation.{} max_attempts must be at least 1",
                    name
                )));
            }
            if !policy.backoff.is_valid() || !policy.settle.is_none_or(|s| s.is_valid()) {
                return Err(ConfigError::Message(format!(
                    "navigation.{} has an invalid delay range",
                    name
                )));
            }
        }

        let ranges = [
            &self.navigation.typing_pause,
            &self.specifications.reveal.pause,
            &self.specifications.reveal.fallback_pause,
        ];
        if ranges.iter().any(|range| !range.is_valid()) {
            return Err(ConfigError::Message("Pause ranges must satisfy 0 <= min <= max".into()));
        }

        if self.navigation.interaction_timeout_secs == 0
            || self.extraction.field_timeout_secs == 0
            || self.specifications.wait_timeout_secs == 0
        {
            return Err(ConfigError::Message("Wait timeouts must be greater than 0".into()));
        }

        for selector in self.selectors() {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::Message(format!("Invalid CSS selector: {}", selector)));
            }
        }

        if let Some(path) = self
            .canonical
            .paths
            .iter()
            .find(|path| path.section.trim().is_empty() || path.key.trim().is_empty())
        {
            return Err(ConfigError::Message(format!(
                "Canonical path for {} needs a section and a key",
                path.field
            )));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "Database max_connections must be greater than 0".into(),
            ));
        }

        if self.logging.file_name.trim().is_empty() {
            return Err(ConfigError::Message("Log file name must not be empty".into()));
        }

        Ok(())
    }

    fn selectors(&self) -> Vec<&str> {
        let nav = &self.navigation.selectors;
        let fields = &self.extraction.selectors;
        let specs = &self.specifications;
        vec![
            &nav.search_input,
            &nav.search_submit,
            &nav.first_in_stock_result,
            &fields.title,
            &fields.price,
            &fields.photos,
            &fields.review_count,
            &fields.code,
            &specs.block,
            &specs.item,
            &specs.header,
            &specs.row,
            &specs.fragment,
            &specs.link,
            &specs.expand_button,
        ]
        .into_iter()
        .map(String::as_str)
        .collect()
    }
}
