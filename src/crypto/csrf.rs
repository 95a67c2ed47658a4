use base64::Engine as _;

use uuid::Uuid;

use crate::crypto::{SigningKey, BASE64_ENGINE};

/// Name of the anti-forgery cookie set alongside the form token
pub const CSRF_COOKIE_NAME: &str = "__csrf_token";

/// The individual ways a submitted token can fail verification.
///
/// The distinction only exists for logging; callers must collapse all of
/// these into a single generic rejection before anything reaches the client.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CsrfFailure {
    #[error("form body did not include a token")]
    MissingBodyToken,
    #[error("request did not include the anti-forgery cookie")]
    MissingCookieToken,
    #[error("anti-forgery cookie is not of the form value.signature")]
    MalformedCookie,
    #[error("form token does not match the cookie token")]
    TokenMismatch,
    #[error("cookie signature does not verify against the server key")]
    InvalidSignature,
}

/// A freshly issued anti-forgery token pair.
///
/// The form token goes into the response body (for the page to embed as a
/// hidden field); the cookie value carries the same token plus its
/// signature and must be set as an HttpOnly cookie. Nothing is stored
/// server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCsrfToken {
    form_token: String,
    cookie_value: String,
}

impl IssuedCsrfToken {
    /// Token value to embed in the form page
    pub fn form_token(&self) -> &str {
        &self.form_token
    }

    /// `value.signature` string to place in the anti-forgery cookie
    pub fn cookie_value(&self) -> &str {
        &self.cookie_value
    }
}

/// Issue a fresh token pair for a double-submit cookie exchange
pub fn issue(key: &SigningKey) -> IssuedCsrfToken {
    let value = Uuid::new_v4().to_string();

    let signature = key.sign(value.as_bytes());
    let cookie_value = format!("{}.{}", value, BASE64_ENGINE.encode(signature));

    IssuedCsrfToken {
        form_token: value,
        cookie_value,
    }
}

/// Verify a submitted form token against the replayed anti-forgery cookie.
///
/// Checks run in a fixed order, each with its own failure mode:
/// body token present, cookie present, cookie well-formed, token values
/// byte-equal, signature valid under the server key. Pure function of its
/// inputs and the key; no side effects.
pub fn verify(
    key: &SigningKey,
    body_token: Option<&str>,
    cookie_value: Option<&str>,
) -> Result<(), CsrfFailure> {
    let body_token = body_token
        .filter(|token| !token.is_empty())
        .ok_or(CsrfFailure::MissingBodyToken)?;

    let cookie_value = cookie_value
        .filter(|cookie| !cookie.is_empty())
        .ok_or(CsrfFailure::MissingCookieToken)?;

    let (cookie_token, signature) = cookie_value
        .split_once('.')
        .ok_or(CsrfFailure::MalformedCookie)?;

    // An empty segment is malformed, never a valid empty signature
    if cookie_token.is_empty() || signature.is_empty() {
        return Err(CsrfFailure::MalformedCookie);
    }

    if body_token != cookie_token {
        return Err(CsrfFailure::TokenMismatch);
    }

    // Decoding belongs to the signature check, not the structural one; an
    // undecodable signature can never verify
    let signature = BASE64_ENGINE
        .decode(signature)
        .map_err(|_| CsrfFailure::InvalidSignature)?;

    if !key.verify(body_token.as_bytes(), &signature) {
        return Err(CsrfFailure::InvalidSignature);
    }

    Ok(())
}
