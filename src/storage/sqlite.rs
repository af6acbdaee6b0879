use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};

use crate::config::DatabaseConfig;
use crate::models::{ProductRecord, SpecificationTree, StoredProduct};
use crate::storage::ProductSink;
use crate::utils::error::Result;

const CSV_HEADER: [&str; 14] = [
    "id",
    "created_at",
    "title",
    "regular_price",
    "sale_price",
    "photos",
    "review_count",
    "code",
    "specifications",
    "manufacturer",
    "memory",
    "color",
    "screen_diagonal",
    "screen_resolution",
];

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    title: Option<String>,
    regular_price: Option<f64>,
    sale_price: Option<f64>,
    photos: String,
    review_count: Option<i64>,
    code: Option<String>,
    specifications: String,
    manufacturer: Option<String>,
    memory: Option<String>,
    color: Option<String>,
    screen_diagonal: Option<String>,
    screen_resolution: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for StoredProduct {
    type Error = serde_json::Error;

    fn try_from(row: ProductRow) -> std::result::Result<Self, Self::Error> {
        let photos: Vec<String> = serde_json::from_str(&row.photos)?;
        let specifications: SpecificationTree = serde_json::from_str(&row.specifications)?;

        Ok(StoredProduct {
            id: row.id,
            created_at: row.created_at,
            record: ProductRecord {
                title: row.title,
                regular_price: row.regular_price,
                sale_price: row.sale_price,
                photos,
                review_count: row.review_count,
                code: row.code,
                specifications,
                manufacturer: row.manufacturer,
                memory: row.memory,
                color: row.color,
                screen_diagonal: row.screen_diagonal,
                screen_resolution: row.screen_resolution,
            },
        })
    }
}

/// SQLite-backed product store.
#[derive(Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    /// Open the database, creating its directory when needed, and run the
    /// embedded migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = database_file(&config.url).and_then(|path| path.parent()) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn list(&self) -> Result<Vec<StoredProduct>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, title, regular_price, sale_price, photos, review_count, code,
                   specifications, manufacturer, memory, color, screen_diagonal,
                   screen_resolution, created_at
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let products = rows
            .into_iter()
            .map(StoredProduct::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(products)
    }
}

#[async_trait]
impl ProductSink for SqliteProductStore {
    async fn save(&self, record: &ProductRecord) -> Result<i64> {
        let photos = serde_json::to_string(&record.photos)?;
        let specifications = serde_json::to_string(&record.specifications)?;

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                title, regular_price, sale_price, photos, review_count, code,
                specifications, manufacturer, memory, color, screen_diagonal,
                screen_resolution, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.title)
        .bind(record.regular_price)
        .bind(record.sale_price)
        .bind(photos)
        .bind(record.review_count)
        .bind(&record.code)
        .bind(specifications)
        .bind(&record.manufacturer)
        .bind(&record.memory)
        .bind(&record.color)
        .bind(&record.screen_diagonal)
        .bind(&record.screen_resolution)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!("Product saved with id {}", id);
        Ok(id)
    }

    async fn export_csv(&self, path: &Path) -> Result<usize> {
        let products = self.list().await?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        for product in &products {
            writer.write_record(csv_row(product)?)?;
        }
        writer.flush()?;

        tracing::info!("Exported {} products to {}", products.len(), path.display());
        Ok(products.len())
    }
}

fn csv_row(product: &StoredProduct) -> Result<Vec<String>> {
    fn text<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    let record = &product.record;
    Ok(vec![
        product.id.to_string(),
        product.created_at.to_rfc3339(),
        text(&record.title),
        text(&record.regular_price),
        text(&record.sale_price),
        serde_json::to_string(&record.photos)?,
        text(&record.review_count),
        text(&record.code),
        serde_json::to_string(&record.specifications)?,
        text(&record.manufacturer),
        text(&record.memory),
        text(&record.color),
        text(&record.screen_diagonal),
        text(&record.screen_resolution),
    ])
}

/// File path behind a `sqlite:` URL, or `None` for in-memory databases.
fn database_file(url: &str) -> Option<&Path> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}
