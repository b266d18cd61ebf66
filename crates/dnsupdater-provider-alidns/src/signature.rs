//! Alidns RPC request signing (signature version 1.0)
//!
//! ```text
//! canonical     = sorted(params).map(enc(k) "=" enc(v)).join("&")
//! StringToSign  = METHOD "&" enc("/") "&" enc(canonical)
//! Signature     = base64(HMAC-SHA1(secret "&", StringToSign))
//! ```
//!
//! `enc` is RFC 3986 percent-encoding: only `A-Z a-z 0-9 - _ . ~` are left
//! as-is, everything else becomes `%XX` with uppercase hex.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use std::collections::BTreeMap;

type HmacSha1 = Hmac<Sha1>;

/// Characters that must be escaped: everything except RFC 3986 unreserved
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single key or value
pub(crate) fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, RFC3986).to_string()
}

/// Build the canonicalized query string from sorted parameters
pub(crate) fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the string that gets signed
pub(crate) fn string_to_sign(method: &str, canonical_query: &str) -> String {
    format!(
        "{}&{}&{}",
        method,
        percent_encode("/"),
        percent_encode(canonical_query)
    )
}

/// Sign `string_to_sign` with the AccessKey secret
pub(crate) fn sign(access_key_secret: &str, string_to_sign: &str) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = HmacSha1::new_from_slice(format!("{}&", access_key_secret).as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any size"));
    mac.update(string_to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Produce the full signed query string for a GET request
pub(crate) fn signed_query(params: &BTreeMap<String, String>, access_key_secret: &str) -> String {
    let canonical = canonical_query(params);
    let signature = sign(access_key_secret, &string_to_sign("GET", &canonical));
    format!("{}&Signature={}", canonical, percent_encode(&signature))
}
