/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、Auth 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - GatewayConfig: 認証 gateway 用の不変設定 (起動時に一度だけ生成)
 */
use std::fmt;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use axum::http::StatusCode;
use jsonwebtoken::Algorithm;

use crate::services::auth::exemption::ExemptionRules;

/// One year. Issued `exp` values must stay far from `i64` overflow.
pub const MAX_TOKEN_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;
pub const MAX_LEEWAY_SECONDS: u64 = 60 * 60;
const MAX_REVOCATION_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationMode {
    Disabled,
    LegacyAdminOnly,
    SubjectDenylist { valkey_url: String },
}

impl RevocationMode {
    fn parse(raw: Option<&str>, valkey_url: Option<String>) -> Result<Self, ConfigError> {
        let raw = raw.map(|s| s.trim().to_ascii_lowercase());
        match (raw.as_deref(), valkey_url) {
            (None, Some(valkey_url)) => Ok(Self::SubjectDenylist { valkey_url }),
            (None, None) | (Some("none"), _) => Ok(Self::Disabled),
            (Some("legacy-admin-only"), _) => Ok(Self::LegacyAdminOnly),
            (Some("subject-denylist"), Some(valkey_url)) => Ok(Self::SubjectDenylist { valkey_url }),
            (Some("subject-denylist"), None) => Err(ConfigError::Missing("VALKEY_URL")),
            (Some(_), _) => Err(ConfigError::Invalid("REVOCATION_POLICY")),
        }
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub api_prefix: String,

    pub auth_secret: String,
    pub auth_algorithms: Vec<Algorithm>,
    pub access_token_ttl_seconds: u64,
    pub access_token_leeway_seconds: u64,
    pub exemptions: ExemptionRules,

    pub revocation_mode: RevocationMode,
    pub revocation_timeout: Duration,

    pub validation_error_status: StatusCode,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let api_prefix = parse_api_prefix(
            &std::env::var("API_URL").unwrap_or_else(|_| "/api/v1".to_string()),
        )?;

        let auth_secret =
            std::env::var("AUTH_SECRET").map_err(|_| ConfigError::Missing("AUTH_SECRET"))?;
        if auth_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("AUTH_SECRET"));
        }

        let auth_algorithms = parse_algorithms(
            &std::env::var("AUTH_ALGORITHMS").unwrap_or_else(|_| "HS256".to_string()),
        )?;

        let access_token_ttl_seconds = parse_bounded(
            "ACCESS_TOKEN_TTL_SECONDS",
            std::env::var("ACCESS_TOKEN_TTL_SECONDS").ok().as_deref(),
            86_400, // 1 day
            1..=MAX_TOKEN_TTL_SECONDS,
        )?;

        let access_token_leeway_seconds = parse_bounded(
            "ACCESS_TOKEN_LEEWAY_SECONDS",
            std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS").ok().as_deref(),
            0,
            0..=MAX_LEEWAY_SECONDS,
        )?;

        let exemptions = match std::env::var("AUTH_EXEMPTIONS") {
            Ok(raw) => ExemptionRules::parse_list(&raw).map_err(|e| {
                tracing::error!(error = %e, "failed to parse AUTH_EXEMPTIONS");
                ConfigError::Invalid("AUTH_EXEMPTIONS")
            })?,
            Err(_) => ExemptionRules::defaults(&api_prefix),
        };

        let valkey_url = std::env::var("VALKEY_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let revocation_mode =
            RevocationMode::parse(std::env::var("REVOCATION_POLICY").ok().as_deref(), valkey_url)?;

        let revocation_timeout = Duration::from_millis(parse_bounded(
            "REVOCATION_TIMEOUT_MS",
            std::env::var("REVOCATION_TIMEOUT_MS").ok().as_deref(),
            500,
            1..=MAX_REVOCATION_TIMEOUT_MS,
        )?);

        let validation_error_status = match std::env::var("VALIDATION_ERROR_STATUS")
            .unwrap_or_else(|_| "400".to_string())
            .trim()
        {
            "400" => StatusCode::BAD_REQUEST,
            "401" => StatusCode::UNAUTHORIZED,
            _ => return Err(ConfigError::Invalid("VALIDATION_ERROR_STATUS")),
        };

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            api_prefix,
            auth_secret,
            auth_algorithms,
            access_token_ttl_seconds,
            access_token_leeway_seconds,
            exemptions,
            revocation_mode,
            revocation_timeout,
            validation_error_status,
        })
    }
}

/// Unset means `default`; anything unparsable or outside `range` is a startup error.
fn parse_bounded(
    key: &'static str,
    raw: Option<&str>,
    default: u64,
    range: RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|v| range.contains(v))
        .ok_or(ConfigError::Invalid(key))
}

/// `/api/v1`, `api/v1/` -> `/api/v1`. The root itself is not a valid prefix.
fn parse_api_prefix(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(ConfigError::Invalid("API_URL"));
    }
    Ok(format!("/{trimmed}"))
}

/// Comma separated HMAC algorithm names. The secret is symmetric, so nothing else fits.
fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = Algorithm::from_str(name).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHMS"))?;
        if !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
        }
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
    }
    Ok(algorithms)
}

/// Immutable gateway settings, built once at startup and shared behind `Arc`.
///
/// `algorithms` is never empty; the first entry signs new credentials.
#[derive(Clone)]
pub struct GatewayConfig {
    pub secret: String,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
    pub token_ttl_seconds: u64,
    pub exemptions: ExemptionRules,
    pub revocation_timeout: Duration,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("secret", &"<redacted>")
            .field("algorithms", &self.algorithms)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("exemptions", &self.exemptions.len())
            .field("revocation_timeout", &self.revocation_timeout)
            .finish()
    }
}

impl GatewayConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secret: config.auth_secret.clone(),
            algorithms: config.auth_algorithms.clone(),
            leeway_seconds: config.access_token_leeway_seconds,
            token_ttl_seconds: config.access_token_ttl_seconds,
            exemptions: config.exemptions.clone(),
            revocation_timeout: config.revocation_timeout,
        }
    }
}
