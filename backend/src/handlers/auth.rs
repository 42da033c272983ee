use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use uuid::Uuid;

use crate::constants::USER_ID_HEADER;
use crate::error::CoreError;

/// The authenticated caller. Identity is established upstream; the gateway
/// forwards the user id in a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub Uuid);

pub fn user_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
}

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = CoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers)
            .map(ActingUser)
            .ok_or(CoreError::Unauthorized("missing or invalid user id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_reads_user_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(user_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_rejects_missing_or_garbage() {
        assert_eq!(user_from_headers(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(user_from_headers(&headers), None);
    }
}
