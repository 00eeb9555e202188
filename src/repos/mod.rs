pub mod category_repo;
pub mod error;
pub mod product_repo;
pub mod user_repo;
