//! Login endpoint for the administrative principal

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;

use crate::auth::AdminCredentials;
use crate::auth::ADMIN_ROLE;

use super::current_admin::generate_token;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Username of the admin
    username: String,

    /// Password of the admin
    password: String,
}

/// The user part of a login response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// The username
    pub username: String,

    /// The role
    pub role: String,
}

/// A fresh credential plus the identity it was issued for
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Bearer token for follow-up requests in the `Authorization` header
    pub token: String,

    /// The authenticated identity
    pub user: UserResponse,
}

/// Trade the admin username/password for a bearer credential
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "admin", "password": "verysecret" }' \
///     http://localhost:6000/api/auth/login
/// ```
///
/// Response
/// ```json
/// { "data": { "token": "some token", "user": { "username": "admin", "role": "admin" } } }
/// ```
pub async fn login(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(credentials): Extension<AdminCredentials>,
    Form(form): Form<LoginForm>,
) -> Result<Success<TokenResponse>, Error> {
    if form.username.is_empty() || form.password.is_empty() {
        return Err(Error::bad_request("Username and password are required"));
    }

    if !credentials.matches(&form.username, &form.password) {
        return Err(Error::invalid_credentials());
    }

    let token = generate_token(&jwt_keys)?;

    Ok(Success::ok(TokenResponse {
        token,
        user: UserResponse {
            username: credentials.username().to_string(),
            role: ADMIN_ROLE.to_string(),
        },
    }))
}
