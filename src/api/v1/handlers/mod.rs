pub mod categories;
pub mod fallback;
pub mod health;
pub mod products;
pub mod users;
