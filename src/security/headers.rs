//! Header manipulation between client, gateway and backend.
//!
//! # Responsibilities
//! - Drop headers the upstream client recomputes on the outbound request
//! - Inject the authenticated identity as `X-User-*` headers
//! - Drop framing headers that no longer describe the relayed body
//!
//! # Design Decisions
//! - Client-sent identity headers are always dropped, so backends only see
//!   `X-User-*` values the gateway derived from a verified token
//! - Bodies are decoded by the upstream client, so `content-encoding` never
//!   survives in either direction

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::security::access_control::Identity;

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_TENANT_ID: HeaderName = HeaderName::from_static("x-tenant-id");
pub const X_USER_EMAIL: HeaderName = HeaderName::from_static("x-user-email");

const INBOUND_STRIPPED: [HeaderName; 7] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::CONTENT_ENCODING,
    header::TRANSFER_ENCODING,
    X_USER_ID,
    X_TENANT_ID,
    X_USER_EMAIL,
];

const OUTBOUND_STRIPPED: [HeaderName; 3] = [
    header::CONTENT_ENCODING,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

/// Remove headers that must not be copied onto the upstream request.
pub fn sanitize_request_headers(headers: &mut HeaderMap) {
    for name in &INBOUND_STRIPPED {
        headers.remove(name);
    }
}

/// Remove headers that must not be relayed back to the client.
pub fn sanitize_response_headers(headers: &mut HeaderMap) {
    for name in &OUTBOUND_STRIPPED {
        headers.remove(name);
    }
}

/// Set the identity headers. A missing email is sent as an empty value.
pub fn apply_identity(headers: &mut HeaderMap, identity: &Identity) {
    set_text(headers, X_USER_ID, &identity.user_id);
    set_text(headers, X_TENANT_ID, &identity.tenant_id);
    set_text(headers, X_USER_EMAIL, identity.email.as_deref().unwrap_or(""));
}

fn set_text(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => {
            tracing::warn!(header = %name, "Claim value is not a valid header value, dropping");
            headers.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: Option<&str>) -> Identity {
        Identity {
            user_id: "u-1".into(),
            tenant_id: "t-1".into(),
            email: email.map(str::to_string),
            issued_at: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_request_headers_sanitized() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("gateway:8000"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(X_USER_ID, HeaderValue::from_static("spoofed"));
        headers.insert(X_TENANT_ID, HeaderValue::from_static("other-tenant"));
        headers.insert(X_USER_EMAIL, HeaderValue::from_static("root@example.com"));

        sanitize_request_headers(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }

    #[test]
    fn test_response_headers_sanitized() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("br"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        sanitize_response_headers(&mut headers);

        assert!(!headers.contains_key(header::CONTENT_ENCODING));
        assert!(!headers.contains_key(header::CONNECTION));
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_identity_overrides_client_values() {
        let mut headers = HeaderMap::new();
        headers.insert(X_USER_ID, HeaderValue::from_static("spoofed"));

        apply_identity(&mut headers, &identity(Some("a@b.c")));

        assert_eq!(headers[X_USER_ID], "u-1");
        assert_eq!(headers[X_TENANT_ID], "t-1");
        assert_eq!(headers[X_USER_EMAIL], "a@b.c");
    }

    #[test]
    fn test_missing_email_is_empty() {
        let mut headers = HeaderMap::new();
        apply_identity(&mut headers, &identity(None));
        assert_eq!(headers[X_USER_EMAIL], "");
    }
}
