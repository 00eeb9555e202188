use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, de::DeserializeOwned};

use crate::config::GatewayConfig;
use crate::services::auth::AuthError;
use crate::services::auth::principal::{CredentialClaims, Principal};

#[derive(Debug, Deserialize)]
struct RawHeader {
    alg: String,
}

/// HMAC credential verifier.
///
/// Checks run in a fixed order: algorithm allowlist, claim shape, expiry,
/// then signature. An expired token is reported as `Expired` whether or not
/// its signature would verify.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct CredentialValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    algorithms: Vec<Algorithm>,
    leeway_seconds: i64,
}

impl std::fmt::Debug for CredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("CredentialValidator")
            .field("algorithms", &self.algorithms)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl CredentialValidator {
    pub fn new(config: &GatewayConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithms[0]);
        validation.algorithms = config.algorithms.clone();
        // Expiry is checked by us against an explicit clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            decoding_key,
            validation,
            algorithms: config.algorithms.clone(),
            leeway_seconds: i64::try_from(config.leeway_seconds).unwrap_or(i64::MAX),
        }
    }

    pub fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        self.validate_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify `token` as of `now` (unix seconds).
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Principal, AuthError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::MalformedToken);
        };

        let header: RawHeader = decode_segment(header)?;
        // `none` and unknown names fail to parse and count as a disallowed algorithm.
        let alg = Algorithm::from_str(&header.alg).map_err(|_| AuthError::InvalidSignature)?;
        if !self.algorithms.contains(&alg) {
            return Err(AuthError::InvalidSignature);
        }

        let unverified: CredentialClaims = decode_segment(payload)?;
        if self.is_expired(unverified.exp, now) {
            return Err(AuthError::Expired);
        }

        let data =
            jsonwebtoken::decode::<CredentialClaims>(token, &self.decoding_key, &self.validation)
                .map_err(classify_jwt_error)?;

        Principal::from_verified_claims(data.claims)
    }

    fn is_expired(&self, exp: i64, now: i64) -> bool {
        now.saturating_sub(self.leeway_seconds) >= exp
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
}

fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::services::auth::issuer::CredentialIssuer;
    use crate::services::auth::testing::{NOW, SECRET, gateway_config};

    fn sign(alg: Algorithm, secret: &str, claims: serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::new(alg),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn validator() -> CredentialValidator {
        CredentialValidator::new(&gateway_config())
    }

    #[test]
    fn issued_non_admin_credential_round_trips() {
        let config = gateway_config();
        let issuer = CredentialIssuer::new(&config);
        let subject = Uuid::new_v4();

        let issued = issuer.issue_at(subject, false, NOW).unwrap();
        let principal = validator().validate_at(&issued.token, NOW + 10).unwrap();

        assert_eq!(principal.subject_id(), subject);
        assert!(!principal.is_admin());
        assert_eq!(principal.issued_at(), Some(NOW));
        assert_eq!(principal.expires_at(), issued.expires_at);
    }

    #[test]
    fn huge_leeway_saturates_instead_of_wrapping() {
        let mut config = gateway_config();
        config.leeway_seconds = u64::MAX;
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({"userId": Uuid::new_v4(), "isAdmin": false, "iat": NOW - 120, "exp": NOW - 60}),
        );
        assert!(CredentialValidator::new(&config).validate_at(&token, NOW).is_ok());
    }

    #[test]
    fn expired_credential_is_rejected_even_with_valid_signature() {
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({"userId": Uuid::new_v4(), "isAdmin": true, "iat": NOW - 120, "exp": NOW - 60}),
        );
        assert_eq!(validator().validate_at(&token, NOW), Err(AuthError::Expired));
    }

    #[test]
    fn expired_credential_is_rejected_with_bad_signature_too() {
        let token = sign(
            Algorithm::HS256,
            "some-other-secret",
            json!({"userId": Uuid::new_v4(), "exp": NOW - 1}),
        );
        assert_eq!(validator().validate_at(&token, NOW), Err(AuthError::Expired));
    }

    #[test]
    fn expiry_instant_counts_as_passed() {
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({"userId": Uuid::new_v4(), "exp": NOW}),
        );
        assert_eq!(validator().validate_at(&token, NOW), Err(AuthError::Expired));
        assert!(validator().validate_at(&token, NOW - 1).is_ok());
    }

    #[test]
    fn leeway_is_applied_when_configured() {
        let mut config = gateway_config();
        config.leeway_seconds = 30;
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({"userId": Uuid::new_v4(), "exp": NOW - 10}),
        );
        assert!(CredentialValidator::new(&config).validate_at(&token, NOW).is_ok());
    }

    #[test]
    fn algorithm_outside_allowlist_is_invalid_signature() {
        // Same secret, so the HS512 signature itself would verify.
        let token = sign(
            Algorithm::HS512,
            SECRET,
            json!({"userId": Uuid::new_v4(), "exp": NOW + 60}),
        );
        assert_eq!(
            validator().validate_at(&token, NOW),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn alg_none_is_invalid_signature() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            json!({"userId": Uuid::new_v4(), "isAdmin": true, "exp": NOW + 60})
                .to_string()
                .as_bytes(),
        );
        let token = format!("{header}.{payload}.");
        assert_eq!(
            validator().validate_at(&token, NOW),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let token = sign(
            Algorithm::HS256,
            "not-the-secret",
            json!({"userId": Uuid::new_v4(), "exp": NOW + 60}),
        );
        assert_eq!(
            validator().validate_at(&token, NOW),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let v = validator();
        assert_eq!(v.validate_at("", NOW), Err(AuthError::MalformedToken));
        assert_eq!(v.validate_at("abc", NOW), Err(AuthError::MalformedToken));
        assert_eq!(v.validate_at("a.b.c.d", NOW), Err(AuthError::MalformedToken));
        assert_eq!(v.validate_at("!!.??.xx", NOW), Err(AuthError::MalformedToken));
    }

    #[test]
    fn missing_expiry_is_malformed() {
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({"userId": Uuid::new_v4(), "isAdmin": true}),
        );
        assert_eq!(
            validator().validate_at(&token, NOW),
            Err(AuthError::MalformedToken)
        );
    }

    #[test]
    fn non_uuid_subject_is_malformed() {
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({"userId": "60f1c2", "exp": NOW + 60}),
        );
        assert_eq!(
            validator().validate_at(&token, NOW),
            Err(AuthError::MalformedToken)
        );
    }

    #[test]
    fn extra_claims_are_ignored() {
        let subject = Uuid::new_v4();
        let token = sign(
            Algorithm::HS256,
            SECRET,
            json!({
                "userId": subject,
                "isAdmin": true,
                "exp": NOW + 60,
                "aud": "someone-else",
                "scope": "orders:write",
            }),
        );
        let principal = validator().validate_at(&token, NOW).unwrap();
        assert_eq!(principal.subject_id(), subject);
        assert!(principal.is_admin());
    }
}
