//! Request identification.
//!
//! The relay reuses the engine's request ID when there is one so relay logs
//! line up with the engine's; otherwise it generates a UUID v4.

use hyper::header::HeaderMap;
use uuid::Uuid;

/// Header name for request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID from the headers, or a fresh one.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn reuses_existing_id() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn generates_uuid_when_missing() {
        let id = request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
