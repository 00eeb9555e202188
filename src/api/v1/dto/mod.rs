pub mod categories;
pub mod products;
pub mod users;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: &'static str,
}

impl DeletedResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: "Deletion successful",
        }
    }
}
