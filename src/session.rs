//! Stateless admin session tokens.
//!
//! Token format: `admin:{issued_at_millis}.{hex(HMAC-SHA256(secret, payload))}`.
//! Nothing is stored server side; a token is trusted when its MAC checks out
//! under the configured secret and it is younger than the session TTL.

use axum::http::{header::COOKIE, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const ADMIN_PREFIX: &str = "admin:";
pub const SESSION_COOKIE: &str = "admin_session";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("admin session secret is not configured")]
    MissingSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSession {
    Unauthenticated,
    Authenticated { expires_at: DateTime<Utc> },
}

impl AdminSession {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AdminSession::Authenticated { .. })
    }
}

fn sign(secret: &str, payload: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn issue(secret: &str) -> Result<String, SessionError> {
    issue_at(secret, Utc::now())
}

pub fn issue_at(secret: &str, issued_at: DateTime<Utc>) -> Result<String, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let payload = format!("{}{}", ADMIN_PREFIX, issued_at.timestamp_millis());
    let signature = sign(secret, &payload).ok_or(SessionError::MissingSecret)?;
    Ok(format!("{}.{}", payload, signature))
}

/// Checks signature and prefix only. The embedded issue time is not looked at;
/// see [`inspect`] for the TTL-aware check the HTTP gate uses.
pub fn verify(token: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let Some((payload, signature)) = token.split_once('.') else {
        return false;
    };
    if payload.is_empty() || signature.is_empty() {
        return false;
    }

    let Some(expected) = sign(secret, payload) else {
        return false;
    };

    let signature_matches: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
    signature_matches && payload.starts_with(ADMIN_PREFIX)
}

pub fn issued_at(token: &str) -> Option<DateTime<Utc>> {
    let (payload, _) = token.split_once('.')?;
    let millis = payload.strip_prefix(ADMIN_PREFIX)?.parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis)
}

pub fn inspect(token: &str, secret: &str, ttl: Duration, now: DateTime<Utc>) -> AdminSession {
    if !verify(token, secret) {
        return AdminSession::Unauthenticated;
    }

    match issued_at(token) {
        Some(issued) if issued <= now && now - issued < ttl => AdminSession::Authenticated {
            expires_at: issued + ttl,
        },
        _ => AdminSession::Unauthenticated,
    }
}

pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
