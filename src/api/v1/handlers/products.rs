/*
 * Responsibility
 * - /products 系 handler
 * - 読み取りは公開 (gateway exemption)、書き込みは AdminPrincipal 必須
 * - category の存在確認は repo 呼び出し前に行う (無ければ ValidationFailure)
 */
use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::{
            DeletedResponse,
            categories::CategoryResponse,
            products::{
                ProductCountResponse, ProductDetailResponse, ProductQuery, ProductRequest,
                ProductResponse,
            },
        },
        extractors::{AdminPrincipal, JsonBody, QueryParams, ResourceId},
    },
    error::AppError,
    repos::{category_repo, product_repo},
    state::AppState,
};

const FEATURED_MAX: i64 = 100;

pub async fn list_products(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let categories = query.category_ids().map_err(AppError::validation)?;
    let rows = product_repo::list(&state.db, categories.as_deref()).await?;
    Ok(Json(rows.into_iter().map(ProductResponse::from).collect()))
}

pub async fn get_product(
    State(state): State<AppState>,
    ResourceId(id): ResourceId,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let row = product_repo::get(&state.db, id)
        .await?
        .ok_or(AppError::not_found("product"))?;
    let category_detail = category_repo::get(&state.db, row.category_id)
        .await?
        .map(CategoryResponse::from);

    Ok(Json(ProductDetailResponse {
        product: row.into(),
        category_detail,
    }))
}

pub async fn create_product(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    JsonBody(req): JsonBody<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    req.validate().map_err(AppError::validation)?;
    ensure_category(&state, &req).await?;

    let row = product_repo::create(&state.db, &req.into_fields()).await?;
    tracing::info!(product_id = %row.id, admin_id = %admin.subject_id(), "product created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn update_product(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    ResourceId(id): ResourceId,
    JsonBody(req): JsonBody<ProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;
    ensure_category(&state, &req).await?;

    let row = product_repo::update(&state.db, id, &req.into_fields())
        .await?
        .ok_or(AppError::not_found("product"))?;
    Ok(Json(row.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    ResourceId(id): ResourceId,
) -> Result<Json<DeletedResponse>, AppError> {
    if !product_repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("product"));
    }
    Ok(Json(DeletedResponse::ok()))
}

pub async fn count_products(
    State(state): State<AppState>,
) -> Result<Json<ProductCountResponse>, AppError> {
    let product_count = product_repo::count(&state.db).await?;
    Ok(Json(ProductCountResponse { product_count }))
}

/// `GET /products/get/featured/{count}`; `0` means "all featured".
pub async fn featured_products(
    State(state): State<AppState>,
    count: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let Path(count) = count.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    let count: i64 = count
        .parse()
        .ok()
        .filter(|n| (0..=FEATURED_MAX).contains(n))
        .ok_or_else(|| AppError::validation(format!("count must be 0..={FEATURED_MAX}")))?;
    let limit = if count == 0 { FEATURED_MAX } else { count };

    let rows = product_repo::featured(&state.db, limit).await?;
    Ok(Json(rows.into_iter().map(ProductResponse::from).collect()))
}

async fn ensure_category(state: &AppState, req: &ProductRequest) -> Result<(), AppError> {
    if category_repo::exists(&state.db, req.category).await? {
        Ok(())
    } else {
        Err(AppError::validation(format!("unknown category: {}", req.category)))
    }
}
