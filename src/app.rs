/*
 * Responsibility
 * - Config読み込み → 依存生成 (PgPool, auth gateway) → Router 組み立て
 * - Middleware の適用 (外側から: http -> cors -> security_headers -> auth gateway)
 * - axum::serve() で起動
 */
use std::{panic, process};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    error::ErrorClassifier,
    middleware,
    services::auth::build_auth,
    state::AppState,
};

fn init_tracing() {
    // RUST_LOG=info,shop_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    ErrorClassifier::with_validation_status(config.validation_error_status).install();

    tracing::info!(
        "starting API in {:?} mode on {} (prefix {})",
        config.app_env,
        config.addr,
        config.api_prefix
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("failed to run migrations")?;

    let auth = build_auth(config)
        .await
        .context("failed to build auth gateway")?;

    Ok(AppState::new(db, auth))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let gateway = state.gateway.clone();

    let router = Router::new()
        .nest(&config.api_prefix, api::v1::routes())
        .fallback(api::v1::handlers::fallback::route_not_found)
        .with_state(state);

    // inner -> outer
    let router = middleware::auth::access::apply(router, gateway);
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}
