use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::canonical::{CanonicalFields, CanonicalMapper};
use crate::models::SpecificationTree;

/// Scalar and list fields read straight off the product page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub title: Option<String>,
    pub regular_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub photos: Vec<String>,
    pub review_count: Option<i64>,
    pub code: Option<String>,
}

/// Flat product record handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: Option<String>,
    pub regular_price: Option<f64>,
    /// No sale-price element is scraped; always `None` for now.
    pub sale_price: Option<f64>,
    pub photos: Vec<String>,
    pub review_count: Option<i64>,
    pub code: Option<String>,
    pub specifications: SpecificationTree,
    pub manufacturer: Option<String>,
    pub memory: Option<String>,
    pub color: Option<String>,
    pub screen_diagonal: Option<String>,
    pub screen_resolution: Option<String>,
}

impl ProductRecord {
    /// Assemble a record, deriving the canonical fields from `specifications`.
    pub fn assemble(
        fields: ProductFields,
        specifications: SpecificationTree,
        mapper: &CanonicalMapper,
    ) -> Self {
        let CanonicalFields {
            manufacturer,
            memory,
            color,
            screen_diagonal,
            screen_resolution,
        } = mapper.map(&specifications);

        Self {
            title: fields.title,
            regular_price: fields.regular_price,
            sale_price: fields.sale_price,
            photos: fields.photos,
            review_count: fields.review_count,
            code: fields.code,
            specifications,
            manufacturer,
            memory,
            color,
            screen_diagonal,
            screen_resolution,
        }
    }

    /// Names of the fields that came back empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("title", self.title.is_none()),
            ("regular_price", self.regular_price.is_none()),
            ("review_count", self.review_count.is_none()),
            ("code", self.code.is_none()),
            ("specifications", self.specifications.is_empty()),
            ("manufacturer", self.manufacturer.is_none()),
            ("memory", self.memory.is_none()),
            ("color", self.color.is_none()),
            ("screen_diagonal", self.screen_diagonal.is_none()),
            ("screen_resolution", self.screen_resolution.is_none()),
        ];
        checks
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(name, _)| name)
            .collect()
    }
}

/// A record as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProduct {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: ProductRecord,
}
