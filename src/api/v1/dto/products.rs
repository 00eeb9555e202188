/*
 * Responsibility
 * - Products の request/response DTO
 * - validate() で形式チェック (失敗は AppError::Validation)
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::v1::dto::categories::CategoryResponse;
use crate::repos::product_repo::{ProductFields, ProductRow};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub rich_description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub price: f64,
    pub category: Uuid,
    pub count_in_stock: i32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: i32,
    #[serde(default)]
    pub is_featured: bool,
}

impl ProductRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        if self.description.trim().is_empty() {
            return Err("description is required");
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("price must be >= 0");
        }
        if !(0..=255).contains(&self.count_in_stock) {
            return Err("countInStock must be between 0 and 255");
        }
        if !self.rating.is_finite() || !(0.0..=5.0).contains(&self.rating) {
            return Err("rating must be between 0 and 5");
        }
        if self.num_reviews < 0 {
            return Err("numReviews must be >= 0");
        }
        Ok(())
    }

    pub fn into_fields(self) -> ProductFields {
        ProductFields {
            name: self.name.trim().to_string(),
            description: self.description,
            rich_description: self.rich_description,
            image: self.image,
            brand: self.brand,
            price: self.price,
            category_id: self.category,
            count_in_stock: self.count_in_stock,
            rating: self.rating,
            num_reviews: self.num_reviews,
            is_featured: self.is_featured,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    /// Comma separated category ids.
    pub categories: Option<String>,
}

impl ProductQuery {
    pub fn category_ids(&self) -> Result<Option<Vec<Uuid>>, String> {
        let Some(raw) = self.categories.as_deref() else {
            return Ok(None);
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Uuid::parse_str(s).map_err(|_| format!("invalid category id: {s}")))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub rich_description: String,
    pub image: String,
    pub brand: String,
    pub price: f64,
    pub category: Uuid,
    pub count_in_stock: i32,
    pub rating: f64,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub date_created: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for ProductResponse {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            rich_description: row.rich_description,
            image: row.image,
            brand: row.brand,
            price: row.price,
            category: row.category_id,
            count_in_stock: row.count_in_stock,
            rating: row.rating,
            num_reviews: row.num_reviews,
            is_featured: row.is_featured,
            date_created: row.created_at,
        }
    }
}

/// Detail view with the category expanded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    #[serde(rename = "categoryDetail")]
    pub category_detail: Option<CategoryResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCountResponse {
    pub product_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProductRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Trail shoe",
            "description": "Grippy",
            "category": Uuid::new_v4(),
            "countInStock": 12,
            "price": 89.5,
        }))
        .unwrap()
    }

    #[test]
    fn minimal_request_is_valid() {
        let req = request();
        assert!(req.validate().is_ok());
        assert!(!req.is_featured);
        assert_eq!(req.rating, 0.0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut req = request();
        req.count_in_stock = 256;
        assert!(req.validate().is_err());

        let mut req = request();
        req.price = -1.0;
        assert!(req.validate().is_err());

        let mut req = request();
        req.rating = f64::NAN;
        assert!(req.validate().is_err());

        let mut req = request();
        req.name = "   ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn category_filter_parsing() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let q = ProductQuery {
            categories: Some(format!("{a}, {b},")),
        };
        assert_eq!(q.category_ids().unwrap(), Some(vec![a, b]));

        let q = ProductQuery { categories: None };
        assert_eq!(q.category_ids().unwrap(), None);

        let q = ProductQuery {
            categories: Some("23456,56789".into()),
        };
        assert!(q.category_ids().is_err());
    }
}
