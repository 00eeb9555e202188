/*
 * Responsibility
 * - products テーブル向け SQLx 操作
 * - PgPool を受け取り CRUD + count / featured を提供
 */
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub rich_description: String,
    pub image: String,
    pub brand: String,
    pub price: f64,
    pub category_id: Uuid,
    pub count_in_stock: i32,
    pub rating: f64,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Writable product fields (create and full update).
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub rich_description: String,
    pub image: String,
    pub brand: String,
    pub price: f64,
    pub category_id: Uuid,
    pub count_in_stock: i32,
    pub rating: f64,
    pub num_reviews: i32,
    pub is_featured: bool,
}

/// `categories`: only products in one of these categories (None = all).
pub async fn list(db: &PgPool, categories: Option<&[Uuid]>) -> Result<Vec<ProductRow>, RepoError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, description, rich_description, image, brand, price,
               category_id, count_in_stock, rating, num_reviews, is_featured, created_at
        FROM products
        WHERE $1::uuid[] IS NULL OR category_id = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(categories.map(|c| c.to_vec()))
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<ProductRow>, RepoError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, description, rich_description, image, brand, price,
               category_id, count_in_stock, rating, num_reviews, is_featured, created_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn create(db: &PgPool, fields: &ProductFields) -> Result<ProductRow, RepoError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        INSERT INTO products (name, description, rich_description, image, brand, price,
                              category_id, count_in_stock, rating, num_reviews, is_featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id, name, description, rich_description, image, brand, price,
                  category_id, count_in_stock, rating, num_reviews, is_featured, created_at
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(&fields.rich_description)
    .bind(&fields.image)
    .bind(&fields.brand)
    .bind(fields.price)
    .bind(fields.category_id)
    .bind(fields.count_in_stock)
    .bind(fields.rating)
    .bind(fields.num_reviews)
    .bind(fields.is_featured)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    fields: &ProductFields,
) -> Result<Option<ProductRow>, RepoError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        UPDATE products
        SET name = $2, description = $3, rich_description = $4, image = $5, brand = $6,
            price = $7, category_id = $8, count_in_stock = $9, rating = $10,
            num_reviews = $11, is_featured = $12
        WHERE id = $1
        RETURNING id, name, description, rich_description, image, brand, price,
                  category_id, count_in_stock, rating, num_reviews, is_featured, created_at
        "#,
    )
    .bind(id)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(&fields.rich_description)
    .bind(&fields.image)
    .bind(&fields.brand)
    .bind(fields.price)
    .bind(fields.category_id)
    .bind(fields.count_in_stock)
    .bind(fields.rating)
    .bind(fields.num_reviews)
    .bind(fields.is_featured)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, RepoError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count(db: &PgPool) -> Result<i64, RepoError> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(db)
        .await?;
    Ok(n)
}

pub async fn featured(db: &PgPool, limit: i64) -> Result<Vec<ProductRow>, RepoError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, description, rich_description, image, brand, price,
               category_id, count_in_stock, rating, num_reviews, is_featured, created_at
        FROM products
        WHERE is_featured
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(rows)
}
