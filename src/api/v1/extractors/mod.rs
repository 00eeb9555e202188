/*!
 * Request extractors shared by v1 handlers.
 *
 * - CurrentPrincipal / AdminPrincipal: 認証済み主体 (gateway middleware が extensions に格納)
 * - JsonBody: JSON body, rejection を AppError::Validation に変換
 * - ResourceId: path の UUID, 不正なら AppError::Validation
 * - QueryParams: query string, rejection を AppError::Validation に変換
 */
mod body;
mod principal;
mod query;
mod resource_id;

pub use body::JsonBody;
pub use principal::{AdminPrincipal, CurrentPrincipal};
pub use query::QueryParams;
pub use resource_id::ResourceId;
