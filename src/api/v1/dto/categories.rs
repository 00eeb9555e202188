use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::category_repo::CategoryRow;

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl CategoryRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        if let Some(color) = &self.color
            && !(color.starts_with('#') && color.len() <= 9)
        {
            return Err("color must be a hex color like #a1b2c3");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl From<CategoryRow> for CategoryResponse {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            icon: row.icon,
            color: row.color,
        }
    }
}
