//! Bearer token access control.
//!
//! Classifies requests as public or protected and turns a validated JWT into
//! the caller [`Identity`] propagated to backends.

use std::str::FromStr;

use axum::http::{HeaderValue, Method};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::observability::metrics;

/// Whether a request needs a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

/// Caller identity derived from validated token claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub tenant_id: String,
    pub email: Option<String>,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

/// Reasons a protected request is rejected. All map to 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication token required")]
    MissingToken,

    #[error("Malformed Authorization header, expected 'Bearer <token>'")]
    MalformedHeader,

    #[error("Token has expired")]
    ExpiredSignature,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token is valid but user information is missing")]
    MissingClaims,
}

impl AuthError {
    /// Short label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::ExpiredSignature => "expired",
            AuthError::InvalidToken => "invalid",
            AuthError::MissingClaims => "missing_claims",
        }
    }
}

/// Invalid authentication configuration, detected at startup.
#[derive(Debug, Error)]
pub enum AuthSetupError {
    #[error("unsupported JWT algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("invalid JWT key for {algorithm:?}: {source}")]
    InvalidKey {
        algorithm: Algorithm,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// Payload fields read by the gateway. Both claim spellings are separate
/// fields so a token carrying both still decodes; snake_case wins.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default, rename = "userId")]
    user_id_camel: Option<Value>,
    #[serde(default)]
    tenant_id: Option<Value>,
    #[serde(default, rename = "tenantId")]
    tenant_id_camel: Option<Value>,
    #[serde(default)]
    email: Option<Value>,
    #[serde(default)]
    iat: Option<Value>,
    #[serde(default)]
    exp: Option<Value>,
}

impl Claims {
    fn user_id(&self) -> Option<String> {
        first_text(&self.user_id, &self.user_id_camel)
    }

    fn tenant_id(&self) -> Option<String> {
        first_text(&self.tenant_id, &self.tenant_id_camel)
    }
}

/// Public-route rules plus token validation.
pub struct AuthGate {
    public_prefixes: Vec<String>,
    public_read_prefix: String,
    public_exact_paths: Vec<String>,
    key: DecodingKey,
    validation: Validation,
}

impl AuthGate {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthSetupError> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm)
            .map_err(|_| AuthSetupError::UnsupportedAlgorithm(config.jwt_algorithm.clone()))?;
        let key = decoding_key(algorithm, &config.jwt_secret)?;

        let mut validation = Validation::new(algorithm);
        // `exp` is checked when present but not mandatory, and with no grace
        // period.
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Ok(Self {
            public_prefixes: config.public_prefixes.clone(),
            public_read_prefix: config.public_read_prefix.clone(),
            public_exact_paths: config.public_exact_paths.clone(),
            key,
            validation,
        })
    }

    /// Decide whether `path` requested with `method` needs a token.
    pub fn classify(&self, path: &str, method: &Method) -> Access {
        let public = self.public_prefixes.iter().any(|p| path.starts_with(p.as_str()))
            || (method == Method::GET && path.starts_with(self.public_read_prefix.as_str()))
            || self.public_exact_paths.iter().any(|p| p == path);

        if public {
            Access::Public
        } else {
            Access::Protected
        }
    }

    /// Extract the token from an `Authorization` value. Returns `None` unless
    /// the value is exactly two whitespace-separated parts with a
    /// case-insensitive `bearer` scheme.
    pub fn extract_token(authorization: &str) -> Option<&str> {
        let mut parts = authorization.split_whitespace();
        let scheme = parts.next()?;
        let token = parts.next()?;
        if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        Some(token)
    }

    /// Authenticate from the raw `Authorization` header.
    pub fn authenticate(&self, authorization: Option<&HeaderValue>) -> Result<Identity, AuthError> {
        let header = authorization.ok_or(AuthError::MissingToken)?;
        let raw = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
        let token = Self::extract_token(raw).ok_or(AuthError::MalformedHeader)?;
        self.validate_token(token)
    }

    /// Verify signature and expiry, then require user and tenant claims.
    pub fn validate_token(&self, token: &str) -> Result<Identity, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredSignature,
                ErrorKind::InvalidKeyFormat | ErrorKind::InvalidRsaKey(_) | ErrorKind::Crypto(_) => {
                    tracing::error!(error = %e, "Token validation failed unexpectedly");
                    AuthError::InvalidToken
                }
                _ => AuthError::InvalidToken,
            },
        )?;

        let claims = data.claims;
        let (Some(user_id), Some(tenant_id)) = (claims.user_id(), claims.tenant_id()) else {
            return Err(AuthError::MissingClaims);
        };

        Ok(Identity {
            user_id,
            tenant_id,
            email: claims.email.as_ref().and_then(Value::as_str).map(str::to_string),
            issued_at: claims.iat.as_ref().and_then(timestamp),
            expires_at: claims.exp.as_ref().and_then(timestamp),
        })
    }

    /// Full gate: `Ok(None)` for public requests, `Ok(Some(identity))` for
    /// authenticated protected requests.
    pub fn authorize(
        &self,
        path: &str,
        method: &Method,
        authorization: Option<&HeaderValue>,
    ) -> Result<Option<Identity>, AuthError> {
        if self.classify(path, method) == Access::Public {
            tracing::debug!(method = %method, path = %path, "Public route");
            return Ok(None);
        }

        match self.authenticate(authorization) {
            Ok(identity) => {
                tracing::debug!(
                    user_id = %identity.user_id,
                    tenant_id = %identity.tenant_id,
                    "Authenticated request"
                );
                Ok(Some(identity))
            }
            Err(e) => {
                tracing::warn!(method = %method, path = %path, reason = e.reason(), "Authentication failed");
                metrics::record_auth_failure(e.reason());
                Err(e)
            }
        }
    }
}

fn decoding_key(algorithm: Algorithm, secret: &str) -> Result<DecodingKey, AuthSetupError> {
    let invalid = |source: jsonwebtoken::errors::Error| AuthSetupError::InvalidKey { algorithm, source };
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Ok(DecodingKey::from_secret(secret.as_bytes()))
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(secret.as_bytes()).map_err(invalid),
        Algorithm::ES256 | Algorithm::ES384 => {
            DecodingKey::from_ec_pem(secret.as_bytes()).map_err(invalid)
        }
        Algorithm::EdDSA => DecodingKey::from_ed_pem(secret.as_bytes()).map_err(invalid),
    }
}

/// Text of an identity claim; empty strings, zero, null and non-scalar
/// values count as absent.
fn claim_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(primary: &Option<Value>, fallback: &Option<Value>) -> Option<String> {
    primary
        .as_ref()
        .and_then(claim_text)
        .or_else(|| fallback.as_ref().and_then(claim_text))
}

/// NumericDate claim as whole seconds; fractional dates are truncated.
fn timestamp(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|secs| secs as i64))
}
