//! The administrative identity
//!
//! Trimly knows exactly one principal. Its credentials come from the
//! environment at startup; the password only ever lives in process memory
//! as an argon2 hash.

use crate::password::generate;
use crate::password::hash;
use crate::password::verify;
use crate::utils::env_var_or_else;

/// Fixed subject of the administrative principal
pub const ADMIN_SUBJECT: &str = "admin";

/// Fixed role of the administrative principal
pub const ADMIN_ROLE: &str = "admin";

/// The configured admin identity
#[derive(Clone)]
pub struct AdminCredentials {
    /// The username
    username: String,

    /// The hashed password
    hashed_password: String,
}

impl AdminCredentials {
    /// Load the admin identity from the environment
    ///
    /// Missing values are generated and logged, like any other bootstrap
    /// secret.
    pub fn from_env() -> Self {
        let username = env_var_or_else("ADMIN_USERNAME", || {
            tracing::info!("`ADMIN_USERNAME` is not set, using: {ADMIN_SUBJECT}");
            ADMIN_SUBJECT.to_string()
        });

        let password = env_var_or_else("ADMIN_PASSWORD", || {
            let password = generate();
            tracing::info!("`ADMIN_PASSWORD` is not set, generating temporary one: {password}");
            password
        });

        Self::new(username, &password)
    }

    /// Create an admin identity from a plain password
    pub fn new(username: String, password: &str) -> Self {
        Self {
            username,
            hashed_password: hash(password),
        }
    }

    /// Check a login attempt against the configured identity
    ///
    /// Both checks collapse into one boolean; which of the two failed is
    /// not observable to the caller.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let username_matches = self.username == username;
        let password_matches = verify(&self.hashed_password, password);

        username_matches && password_matches
    }

    /// The configured username
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        let credentials = AdminCredentials::new("admin".to_string(), "verysecret");

        assert!(credentials.matches("admin", "verysecret"));
        assert!(!credentials.matches("admin", "wrong"));
        assert!(!credentials.matches("someone", "verysecret"));
        assert!(!credentials.matches("", ""));
    }
}
