/*
 * Responsibility
 * - /users 系 handler (管理者 CRUD, register/login, credential revocation)
 * - password は argon2 で hash してから repo に渡す
 * - login 失敗は理由を区別せず ValidationFailure
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::{
            DeletedResponse,
            users::{
                LoginRequest, LoginResponse, RevocationResponse, UserCountResponse, UserRequest,
                UserResponse,
            },
        },
        extractors::{AdminPrincipal, CurrentPrincipal, JsonBody, ResourceId},
    },
    error::AppError,
    repos::user_repo::{self, NewUser},
    services::auth::{
        AuthError,
        password::{hash_password, verify_password},
        revocation::RevocationError,
    },
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let rows = user_repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

/// Admins may read anyone; other users only themselves.
pub async fn get_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    ResourceId(id): ResourceId,
) -> Result<Json<UserResponse>, AppError> {
    if !principal.is_admin() && principal.subject_id() != id {
        return Err(AppError::Unauthorized(AuthError::AdminRequired));
    }

    let row = user_repo::get(&state.db, id)
        .await?
        .ok_or(AppError::not_found("user"))?;
    Ok(Json(row.into()))
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    JsonBody(req): JsonBody<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let row = insert_user(&state, req, true).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// Self-service sign up. `isAdmin` in the body is ignored.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let row = insert_user(&state, req, false).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let Some(user) = user_repo::find_for_login(&state.db, req.email.trim()).await? else {
        tracing::info!("login refused: unknown email");
        return Err(AppError::validation("invalid credentials"));
    };

    if !verify_password(req.password, user.password_hash).await? {
        tracing::info!(user_id = %user.id, "login refused: wrong password");
        return Err(AppError::validation("invalid credentials"));
    }

    let issued = state.issuer.issue(user.id, user.is_admin)?;
    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "credential issued");

    Ok(Json(LoginResponse {
        user: user.email,
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

pub async fn count_users(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
) -> Result<Json<UserCountResponse>, AppError> {
    let user_count = user_repo::count(&state.db).await?;
    Ok(Json(UserCountResponse { user_count }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    ResourceId(id): ResourceId,
) -> Result<Json<DeletedResponse>, AppError> {
    if !user_repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("user"));
    }
    Ok(Json(DeletedResponse::ok()))
}

/// Refuse every credential of the user issued up to now.
pub async fn revoke_user(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    ResourceId(id): ResourceId,
) -> Result<Json<RevocationResponse>, AppError> {
    let now = chrono::Utc::now().timestamp();
    state
        .revocation
        .revoke_subject(id, now)
        .await
        .map_err(revocation_error)?;

    tracing::info!(user_id = %id, admin_id = %admin.subject_id(), "user credentials revoked");
    Ok(Json(RevocationResponse {
        user_id: id,
        revoked: true,
    }))
}

pub async fn restore_user(
    State(state): State<AppState>,
    AdminPrincipal(_): AdminPrincipal,
    ResourceId(id): ResourceId,
) -> Result<Json<RevocationResponse>, AppError> {
    let removed = state
        .revocation
        .restore_subject(id)
        .await
        .map_err(revocation_error)?;
    if !removed {
        return Err(AppError::not_found("revocation"));
    }

    Ok(Json(RevocationResponse {
        user_id: id,
        revoked: false,
    }))
}

async fn insert_user(
    state: &AppState,
    req: UserRequest,
    allow_admin: bool,
) -> Result<user_repo::UserRow, AppError> {
    req.validate().map_err(AppError::validation)?;

    let password_hash = hash_password(req.password).await?;
    let user = NewUser {
        name: req.name.trim().to_string(),
        email: req.email.trim().to_ascii_lowercase(),
        password_hash,
        phone: req.phone,
        is_admin: allow_admin && req.is_admin,
        street: req.street,
        apartment: req.apartment,
        zip: req.zip,
        city: req.city,
        country: req.country,
    };

    let row = user_repo::create(&state.db, &user).await?;
    tracing::info!(user_id = %row.id, is_admin = row.is_admin, "user created");
    Ok(row)
}

fn revocation_error(err: RevocationError) -> AppError {
    match err {
        RevocationError::Unsupported(policy) => {
            AppError::validation(format!("revocation policy '{policy}' cannot revoke subjects"))
        }
        other => AppError::internal(format!("revocation store failed: {other}")),
    }
}
