use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Product fields embedded into review responses.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
}

/// Customer review. New reviews stay hidden until an admin approves them.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    /// `None` once the reviewed product has been deleted.
    pub product: Option<ProductRef>,
    pub rating: i64,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub images: Vec<String>,
    pub is_approved: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated review submission.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: Uuid,
    pub rating: i64,
    pub user_name: String,
    pub user_image: Option<String>,
    pub video_link: Option<String>,
    pub comment: Option<String>,
    pub images: Vec<String>,
}

/// Public review submission body. Moderation flags are not accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReview {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_image: Option<String>,
    #[serde(default)]
    pub video_link: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

/// Admin moderation body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateReview {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

/// Listing filters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReviewFilter {
    pub approved_only: bool,
    pub featured_only: bool,
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub public: Option<String>,
    pub product_id: Option<String>,
    pub featured: Option<String>,
}
