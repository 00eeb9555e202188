pub mod credential;
pub mod error;
pub mod exemption;
pub mod factory;
pub mod gateway;
pub mod issuer;
pub mod password;
pub mod principal;
pub mod revocation;

#[cfg(test)]
pub(crate) mod testing;

pub use error::AuthError;
pub use factory::build_auth;
pub use gateway::{Gateway, GatewayDecision};
pub use issuer::CredentialIssuer;
pub use principal::Principal;
