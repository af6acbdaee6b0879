use super::*;
use card_scraper::core::ProductPipeline;
use card_scraper::storage::ProductSink;

#[tokio::test]
async fn test_repeated_runs_export_one_row_each() -> anyhow::Result<()> {
    let store = memory_store().await?;
    let config = test_config();

    for _ in 0..2 {
        let session = FakeSession::new(FakeSite::retailer());
        ProductPipeline::with_pause(session, &config, NoPause)
            .run(ENTRY_URL, SEARCH_TERM, &store)
            .await?;
    }

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("results").join("products.csv");
    let written = store.export_csv(&path).await?;
    assert_eq!(written, 2);

    let mut reader = csv::Reader::from_path(&path)?;
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(&row[2], SEARCH_TERM);
        assert_eq!(&row[7], "ABC123");
        assert_eq!(&row[9], "Apple");
    }
    Ok(())
}

#[tokio::test]
async fn test_file_database_is_created_with_its_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("data").join("products.db");

    let mut config = test_config();
    config.database.url = format!("sqlite://{}?mode=rwc", db_path.display());

    let store = SqliteProductStore::connect(&config.database).await?;
    let session = FakeSession::new(FakeSite::retailer());
    let record = ProductPipeline::with_pause(session, &config, NoPause)
        .run(ENTRY_URL, SEARCH_TERM, &store)
        .await?;

    assert!(db_path.exists());
    let stored = store.list().await?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record, record);
    Ok(())
}
