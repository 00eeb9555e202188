/*
 * Responsibility
 * - categories テーブル向け SQLx 操作
 */
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

pub async fn list(db: &PgPool) -> Result<Vec<CategoryRow>, RepoError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, icon, color FROM categories ORDER BY name",
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<CategoryRow>, RepoError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, icon, color FROM categories WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn exists(db: &PgPool, id: Uuid) -> Result<bool, RepoError> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(found)
}

pub async fn create(
    db: &PgPool,
    name: &str,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<CategoryRow, RepoError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        r#"
        INSERT INTO categories (name, icon, color)
        VALUES ($1, $2, $3)
        RETURNING id, name, icon, color
        "#,
    )
    .bind(name)
    .bind(icon)
    .bind(color)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    name: &str,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<Option<CategoryRow>, RepoError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        r#"
        UPDATE categories
        SET name = $2, icon = $3, color = $4
        WHERE id = $1
        RETURNING id, name, icon, color
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(icon)
    .bind(color)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Products still pointing at the category make this a `Conflict`.
pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, RepoError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .map_err(RepoError::from_sqlx)?;

    Ok(result.rows_affected() > 0)
}
