use thiserror::Error;

/// Why a request was refused by the gateway.
///
/// All variants surface to the client as the same 401 body; the variant is
/// kept for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("malformed token")]
    MalformedToken,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("credential expired")]
    Expired,
    #[error("credential revoked")]
    Revoked,
    #[error("revocation source unavailable")]
    RevocationUnavailable,
    #[error("administrator privilege required")]
    AdminRequired,
}
