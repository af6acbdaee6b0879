use super::*;
use card_scraper::AppError;
use card_scraper::core::ProductPipeline;

#[tokio::test]
async fn test_out_of_stock_result_is_never_opened() -> anyhow::Result<()> {
    let session = FakeSession::new(FakeSite::retailer().page(OUT_OF_STOCK_HREF, "<html></html>"));
    let config = test_config();

    let pipeline = ProductPipeline::with_pause(session.clone(), &config, NoPause);
    pipeline.collect(ENTRY_URL, SEARCH_TERM).await?;

    let log = session.log();
    assert_eq!(log.visited, vec![ENTRY_URL, "search", IN_STOCK_HREF]);
    assert!(!log.visited.iter().any(|page| page == OUT_OF_STOCK_HREF));
    assert_eq!(log.filled, vec![SEARCH_TERM]);
    Ok(())
}

#[tokio::test]
async fn test_reveal_scrolls_before_and_after_expanding() -> anyhow::Result<()> {
    let session = FakeSession::new(FakeSite::retailer());
    let config = test_config();

    let pipeline = ProductPipeline::with_pause(session.clone(), &config, NoPause);
    pipeline.collect(ENTRY_URL, SEARCH_TERM).await?;

    let log = session.log();
    assert_eq!(log.scrolled, vec![700, 1000]);
    assert_eq!(
        log.clicked.last().map(String::as_str),
        Some(config.specifications.expand_button.as_str())
    );
    Ok(())
}

#[tokio::test]
async fn test_unreachable_site_releases_session() -> anyhow::Result<()> {
    let session = FakeSession::new(FakeSite::default());
    let store = memory_store().await?;
    let config = test_config();

    let pipeline = ProductPipeline::with_pause(session.clone(), &config, NoPause);
    let err = pipeline
        .run(ENTRY_URL, SEARCH_TERM, &store)
        .await
        .unwrap_err();

    match err {
        AppError::ExhaustedRetries { target, attempts, source } => {
            assert_eq!(target, ENTRY_URL);
            assert_eq!(attempts, 3);
            assert!(matches!(source, DriverError::Navigation { .. }));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(session.log().releases, 1);
    assert!(store.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_no_in_stock_result_aborts_before_extraction() -> anyhow::Result<()> {
    let results = r#"<html><body>
        <div class="br-pp" data-stock="0"><a href="/ua/sold-out.html">Sold out</a></div>
    </body></html>"#;
    let site = FakeSite::retailer().search_results(results);
    let session = FakeSession::new(site);
    let store = memory_store().await?;
    let config = test_config();

    let pipeline = ProductPipeline::with_pause(session.clone(), &config, NoPause);
    let err = pipeline
        .run(ENTRY_URL, SEARCH_TERM, &store)
        .await
        .unwrap_err();

    assert!(err.is_navigation_failure());
    assert!(err.to_string().contains("data-stock"));

    let log = session.log();
    assert_eq!(log.releases, 1);
    assert!(log.scrolled.is_empty());
    assert!(store.list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_disabled_search_button_exhausts_retries() -> anyhow::Result<()> {
    let home = HOME_PAGE.replace(
        r#"<input class="qsr-submit" type="submit" value="Знайти">"#,
        r#"<input class="qsr-submit" type="submit" value="Знайти" disabled>"#,
    );
    let session = FakeSession::new(FakeSite::retailer().page(ENTRY_URL, &home));
    let config = test_config();

    let pipeline = ProductPipeline::with_pause(session.clone(), &config, NoPause);
    let err = pipeline.collect(ENTRY_URL, SEARCH_TERM).await.unwrap_err();

    match err {
        AppError::ExhaustedRetries { attempts, source, .. } => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, DriverError::NotInteractable { .. }));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // the term is typed again on every attempt
    assert_eq!(session.log().filled.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_page_without_characteristics_still_saves() -> anyhow::Result<()> {
    let product = r#"<html><body>
        <div class="main-right-block"><h1 class="desktop-only-title">Apple iPhone 15</h1></div>
        <div class="br-pr-price main-price-block"><div class="price-wrapper">Ціну уточнюйте</div></div>
    </body></html>"#;
    let session = FakeSession::new(FakeSite::retailer().page(IN_STOCK_HREF, product));
    let store = memory_store().await?;
    let config = test_config();

    let pipeline = ProductPipeline::with_pause(session.clone(), &config, NoPause);
    let record = pipeline.run(ENTRY_URL, SEARCH_TERM, &store).await?;

    assert_eq!(record.title.as_deref(), Some("Apple iPhone 15"));
    assert_eq!(record.regular_price, None);
    assert!(record.specifications.is_empty());
    assert_eq!(record.manufacturer, None);
    assert_eq!(record.screen_resolution, None);

    let stored = store.list().await?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record, record);
    assert_eq!(session.log().releases, 1);
    Ok(())
}

#[tokio::test]
async fn test_bad_characteristics_selector_stops_before_the_site_is_touched() -> anyhow::Result<()> {
    let session = FakeSession::new(FakeSite::retailer());
    let store = memory_store().await?;
    let mut config = test_config();
    config.specifications.row = "div >".to_string();

    let pipeline = ProductPipeline::with_pause(session.clone(), &config, NoPause);
    let err = pipeline
        .run(ENTRY_URL, SEARCH_TERM, &store)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Selector { .. }));

    let log = session.log();
    assert!(log.visited.is_empty());
    assert_eq!(log.releases, 1);
    drop(log);
    assert!(store.list().await?.is_empty());
    Ok(())
}
