// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard login tokens.
//!
//! Tokens are two base64url segments, `claims.signature`, where the
//! signature is HMAC-SHA256 over the encoded claims with the configured
//! secret. Verification recomputes the MAC and checks expiry; there is no
//! server-side session state.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use balcao_config::model::AuthConfig;
use balcao_core::BalcaoError;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried inside a login token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account email.
    pub sub: String,
    pub name: String,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

struct AuthInner {
    email: String,
    password: String,
    name: String,
    secret: String,
    ttl_hours: i64,
}

/// Credential store and token signer for the single admin account.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<AuthInner>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("email", &self.inner.email)
            .field("password", &"[redacted]")
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl AuthService {
    /// Build from config. `None` when the auth section is incomplete,
    /// which disables the login endpoints.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        let (email, password, secret) = match (
            &config.admin_email,
            &config.admin_password,
            &config.token_secret,
        ) {
            (Some(e), Some(p), Some(s)) => (e.clone(), p.clone(), s.clone()),
            _ => return None,
        };

        Some(Self {
            inner: Arc::new(AuthInner {
                email,
                password,
                name: config.admin_name.clone(),
                secret,
                ttl_hours: config.token_ttl_hours as i64,
            }),
        })
    }

    pub fn email(&self) -> &str {
        &self.inner.email
    }

    pub fn display_name(&self) -> &str {
        &self.inner.name
    }

    /// Check the admin credentials.
    pub fn credentials_match(&self, email: &str, password: &str) -> bool {
        email == self.inner.email && password == self.inner.password
    }

    /// Issue a token for the admin account.
    pub fn sign_token(&self) -> Result<String, BalcaoError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: self.inner.email.clone(),
            name: self.inner.name.clone(),
            iat: now,
            exp: now + self.inner.ttl_hours * 3600,
        };
        let encoded =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).map_err(|e| {
                BalcaoError::Internal(format!("failed to encode token claims: {e}"))
            })?);

        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{encoded}.{signature}"))
    }

    /// Validate a token and return its claims. Rejects bad signatures,
    /// malformed tokens, and expired claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, BalcaoError> {
        let invalid = || BalcaoError::Validation("Token inválido".into());

        let (encoded, signature) = token.split_once('.').ok_or_else(invalid)?;
        let sig_bytes = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;

        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        mac.verify_slice(&sig_bytes).map_err(|_| invalid())?;

        let claims: Claims = serde_json::from_slice(
            &URL_SAFE_NO_PAD.decode(encoded).map_err(|_| invalid())?,
        )
        .map_err(|_| invalid())?;

        if claims.exp < Utc::now().timestamp() {
            return Err(invalid());
        }
        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, BalcaoError> {
        HmacSha256::new_from_slice(self.inner.secret.as_bytes())
            .map_err(|e| BalcaoError::Internal(format!("invalid HMAC key: {e}")))
    }
}
