use tracing::Instrument;
use uuid::Uuid;

use crate::browser::BrowserSession;
use crate::config::{AppConfig, ExtractionConfig, NavigationConfig, SpecificationConfig};
use crate::core::canonical::CanonicalMapper;
use crate::core::extractor::FieldExtractor;
use crate::core::navigator::PageNavigator;
use crate::core::retry::{Pause, RetryExecutor, TokioPause};
use crate::core::specifications::SpecificationParser;
use crate::models::ProductRecord;
use crate::storage::ProductSink;
use crate::utils::error::Result;

/// One scrape of one product: navigate, read fields, read specifications,
/// derive canonical fields, hand the record to a sink.
pub struct ProductPipeline<S, P = TokioPause> {
    session: S,
    retry: RetryExecutor<P>,
    navigation: NavigationConfig,
    extraction: ExtractionConfig,
    specifications: SpecificationConfig,
    mapper: CanonicalMapper,
}

impl<S: BrowserSession> ProductPipeline<S, TokioPause> {
    pub fn new(session: S, config: &AppConfig) -> Self {
        Self::with_pause(session, config, TokioPause)
    }
}

impl<S, P> ProductPipeline<S, P>
where
    S: BrowserSession,
    P: Pause,
{
    pub fn with_pause(session: S, config: &AppConfig, pause: P) -> Self {
        Self {
            session,
            retry: RetryExecutor::new(pause),
            navigation: config.navigation.clone(),
            extraction: config.extraction.clone(),
            specifications: config.specifications.clone(),
            mapper: CanonicalMapper::new(config.canonical.paths.clone()),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Walk to the product page and build its record.
    ///
    /// Fails when navigation gives up, or before touching the page when a
    /// characteristics selector is invalid. Missing fields end up as `None`.
    /// The session is left open.
    pub async fn collect(&self, entry_url: &str, search_term: &str) -> Result<ProductRecord> {
        let parser = SpecificationParser::new(&self.session, &self.retry, &self.specifications)?;

        let mut navigator = PageNavigator::new(&self.session, &self.retry, &self.navigation);
        navigator.navigate_home(entry_url).await?;
        navigator.search(search_term).await?;
        navigator.open_first_result().await?;

        let fields = FieldExtractor::new(&self.session, &self.extraction)
            .extract()
            .await;
        let specifications = parser.collect().await;

        let record = ProductRecord::assemble(fields, specifications, &self.mapper);

        let missing = record.missing_fields();
        if !missing.is_empty() {
            tracing::warn!("Product record is missing: {}", missing.join(", "));
        }

        Ok(record)
    }

    /// Collect, release the browser and save the record once.
    ///
    /// The session is released whether or not collection worked. A failed
    /// save is logged and the record is still returned.
    pub async fn run(
        self,
        entry_url: &str,
        search_term: &str,
        sink: &dyn ProductSink,
    ) -> Result<ProductRecord> {
        let run_id = Uuid::new_v4();

        async move {
            tracing::info!("Starting run for '{}' at {}", search_term, entry_url);

            let outcome = self.collect(entry_url, search_term).await;

            if let Err(e) = self.session.release().await {
                tracing::warn!("Failed to release browser session: {}", e);
            }

            let record = outcome.inspect_err(|e| tracing::error!("Run aborted: {}", e))?;

            match sink.save(&record).await {
                Ok(id) => tracing::info!("Run finished, product stored as {}", id),
                Err(e) => tracing::error!("Failed to store product: {}", e),
            }

            Ok(record)
        }
        .instrument(tracing::info_span!("run", %run_id))
        .await
    }
}
