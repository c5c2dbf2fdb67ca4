//! Current admin service
//!
//! Issues and verifies the bearer credential that gates the management and
//! analytics routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::Extension;
use axum::RequestPartsExt;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use crate::auth::ADMIN_ROLE;
use crate::auth::ADMIN_SUBJECT;

use super::Error;

/// How long an issued credential stays valid
const TOKEN_LIFETIME_SECONDS: i64 = 60 * 60 * 24 * 7;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims identifying the administrative principal
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// Fixed admin subject
    sub: String,

    /// Fixed admin role
    role: String,

    /// Expiry as a unix timestamp
    exp: i64,
}

/// The verified principal behind a request
pub struct CurrentAdmin {
    /// Subject the credential was issued for
    pub subject: String,
}

/// Issue a signed, time-limited credential for the admin
pub fn generate_token(jwt_keys: &JwtKeys) -> Result<String, Error> {
    let claims = Claims {
        sub: ADMIN_SUBJECT.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp: chrono::Utc::now().timestamp() + TOKEN_LIFETIME_SECONDS,
    };

    encode(&Header::default(), &claims, &jwt_keys.encoding).map_err(|err| {
        tracing::error!("Could not issue token: {err}");

        Error::internal_server_error("Could not issue token")
    })
}

impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the token from the authorization header
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::unauthorized())?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let validation = Validation::default();

        // Missing, malformed, expired and badly signed tokens all collapse
        // into the same rejection
        let token_data = decode::<Claims>(bearer.token(), &jwt_keys.decoding, &validation)
            .map_err(|_| Error::unauthorized())?;

        Ok(CurrentAdmin {
            subject: token_data.claims.sub,
        })
    }
}
