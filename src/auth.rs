use axum::http::HeaderMap;

use crate::response::AppError;

/// Set by the upstream auth gateway after it has verified the session.
pub const USER_ID_HEADER: &str = "x-user-id";

pub fn extract_user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn require_user_id(headers: &HeaderMap) -> Result<String, AppError> {
    extract_user_id(headers).ok_or_else(|| AppError::unauthorized("missing caller identity"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_trimmed_header() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  u1 "));
        assert_eq!(extract_user_id(&headers).as_deref(), Some("u1"));
    }

    #[test]
    fn blank_or_missing_header_is_rejected() {
        assert!(require_user_id(&HeaderMap::new()).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        assert!(extract_user_id(&headers).is_none());
    }
}
