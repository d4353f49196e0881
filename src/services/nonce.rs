// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-use sign-in nonces carried in a short-lived cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

/// Cookie holding the outstanding nonce.
pub const NONCE_COOKIE: &str = "siwe";

/// Nonce lifetime (10 minutes).
pub const NONCE_TTL_SECS: i64 = 600;

const NONCE_BYTES: usize = 16;

/// Generate a random alphanumeric nonce (32 lowercase hex chars).
pub fn generate_nonce() -> anyhow::Result<String> {
    random_hex(NONCE_BYTES)
}

/// `bytes` bytes of OS randomness, hex encoded.
pub fn random_hex(bytes: usize) -> anyhow::Result<String> {
    let mut buf = vec![0u8; bytes];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| anyhow::anyhow!("system randomness unavailable"))?;
    Ok(hex::encode(buf))
}

/// Cookie that stores a freshly issued nonce.
pub fn nonce_cookie(nonce: String, secure: bool) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, nonce))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::seconds(NONCE_TTL_SECS))
        .build()
}

/// Cookie matching `nonce_cookie`'s scope, for removal once consumed.
pub fn consumed_nonce_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

/// Constant-time comparison of the stored and submitted nonce.
pub fn nonce_matches(stored: &str, submitted: &str) -> bool {
    !stored.is_empty() && bool::from(stored.as_bytes().ct_eq(submitted.as_bytes()))
}
