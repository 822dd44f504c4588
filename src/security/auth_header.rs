//! Authorization header masking.
//!
//! Keeps a recognised authentication scheme visible and hides the
//! credentials. Anything that does not look like `<scheme> <credentials>`
//! with a known scheme is masked entirely.

use crate::security::masking::asterisks;

/// Schemes kept visible when masking an Authorization header.
pub const KNOWN_AUTH_SCHEMES: [&str; 8] = [
    "Basic",
    "Bearer",
    "Digest",
    "Negotiate",
    "OAuth",
    "AWS4-HMAC-SHA256",
    "HOBA",
    "Mutual",
];

/// Mask an Authorization header value.
pub fn mask_auth_header(value: &str) -> String {
    let Some((scheme, credentials)) = value.split_once(' ') else {
        // likely malformed
        return asterisks(value.chars().count());
    };

    if KNOWN_AUTH_SCHEMES.contains(&scheme) {
        format!("{} {}", scheme, asterisks(credentials.chars().count()))
    } else {
        asterisks(value.chars().count())
    }
}
