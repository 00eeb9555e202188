/*
 * Responsibility
 * - v1 の URL 構造を定義 (/health, /products, /categories, /users)
 * - 認証の要否は gateway の exemption table が決める。ここでは管理者要否のみ extractor で表現
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    categories::{create_category, delete_category, get_category, list_categories, update_category},
    fallback::route_not_found,
    health::health,
    products::{
        count_products, create_product, delete_product, featured_products, get_product,
        list_products, update_product,
    },
    users::{
        count_users, create_user, delete_user, get_user, list_users, login, register,
        restore_user, revoke_user,
    },
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(products())
        .merge(categories())
        .merge(users())
        // Known path, unsupported method: same JSON NotFound as an unknown path.
        .method_not_allowed_fallback(route_not_found)
}

fn products() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/get/count", get(count_products))
        .route("/products/get/featured/{count}", get(featured_products))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

fn categories() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

fn users() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/get/count", get(count_users))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/revoke", post(revoke_user).delete(restore_user))
}
