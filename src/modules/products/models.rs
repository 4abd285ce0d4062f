use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::non_blank;

/// Saree attributes shown on the product page. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blouse: Option<String>,
}

impl ProductSpecs {
    /// Apply an incoming patch: present fields win, blank strings clear.
    pub fn merge(self, patch: ProductSpecs) -> Self {
        fn pick(current: Option<String>, incoming: Option<String>) -> Option<String> {
            match incoming {
                Some(value) => non_blank(Some(value)),
                None => current,
            }
        }

        Self {
            color: pick(self.color, patch.color),
            fabric: pick(self.fabric, patch.fabric),
            design: pick(self.design, patch.design),
            border: pick(self.border, patch.border),
            blouse: pick(self.blouse, patch.blouse),
        }
    }
}

/// Category fields embedded into product responses.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category_id: Uuid,
    /// `None` once the referenced category has been deleted.
    pub category: Option<CategorySummary>,
    pub images: Vec<String>,
    pub specs: ProductSpecs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            category_id: self.category_id,
            images: self.images.clone(),
            specs: self.specs.clone(),
        }
    }
}

/// Fully validated product fields, ready to be written.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Uuid,
    pub images: Vec<String>,
    pub specs: ProductSpecs,
}

/// Request body for creating or updating a product.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    /// Category id.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub specs: Option<ProductSpecs>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderLink {
    pub url: String,
}
