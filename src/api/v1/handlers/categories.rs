/*
 * Responsibility
 * - /categories 系 handler
 * - 一覧/取得は公開、作成/更新/削除は管理者のみ
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::{
            DeletedResponse,
            categories::{CategoryRequest, CategoryResponse},
        },
        extractors::{AdminPrincipal, JsonBody, ResourceId},
    },
    error::AppError,
    repos::category_repo,
    state::AppState,
};

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let rows = category_repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(CategoryResponse::from).collect()))
}

pub async fn get_category(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<CategoryResponse>, AppError> {
    let row = category_repo::get(&state.db, id)
        .await?
        .ok_or(AppError::not_found("category"))?;
    Ok(Json(row.into()))
}

pub async fn create_category(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    JsonBody(req): JsonBody<CategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let row = category_repo::create(
        &state.db,
        req.name.trim(),
        req.icon.as_deref(),
        req.color.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn update_category(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    ResourceId(id): ResourceId,
    JsonBody(req): JsonBody<CategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let row = category_repo::update(
        &state.db,
        id,
        req.name.trim(),
        req.icon.as_deref(),
        req.color.as_deref(),
    )
    .await?
    .ok_or(AppError::not_found("category"))?;
    Ok(Json(row.into()))
}

pub async fn delete_category(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    ResourceId(id): ResourceId,
) -> Result<Json<DeletedResponse>, AppError> {
    if !category_repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("category"));
    }
    Ok(Json(DeletedResponse::ok()))
}
