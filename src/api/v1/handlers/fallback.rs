/*
 * Responsibility
 * - 未定義の path / method への応答 (JSON の NotFound)
 */
use axum::http::{Method, Uri};

use crate::error::AppError;

pub async fn route_not_found(method: Method, uri: Uri) -> AppError {
    tracing::debug!(method = %method, path = %uri.path(), "no route");
    AppError::not_found("route")
}
