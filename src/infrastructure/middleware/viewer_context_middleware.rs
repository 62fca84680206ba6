// ViewerContext Middleware - resolves the bearer session once per request
// and injects the viewer into request extensions for handlers

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::infrastructure::{auth::AuthService, viewer::ViewerContext};

pub const SERVICE_KEY_HEADER: &str = "x-service-key";

/// Application state that can resolve sessions
pub trait HasAuth {
    fn auth(&self) -> &AuthService;
}

/// Application state that knows the privileged service key
pub trait HasServiceKey {
    fn service_role_key(&self) -> Option<&str>;
}

pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Response
where
    T: HasAuth + Clone + Send + Sync + 'static,
{
    let request_id = format!("req-{}", Uuid::new_v4());
    let viewer = match bearer_token(request.headers()) {
        Some(token) => match app_state.auth().session_user(&token).await {
            Ok(user_id) => ViewerContext::authenticated(request_id, user_id, token),
            Err(e) => {
                tracing::debug!("Ignoring bearer token: {}", e);
                ViewerContext::anonymous(request_id)
            }
        },
        None => ViewerContext::anonymous(request_id),
    };

    request.extensions_mut().insert(Arc::new(viewer));
    next.run(request).await
}

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Whether the request carries the configured service key. Always false when no key is configured.
pub fn has_service_key(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    headers
        .get(SERVICE_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|presented| constant_time_eq(presented.as_bytes(), expected.as_bytes()))
        .unwrap_or(false)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));

        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_service_key_requires_configuration() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVICE_KEY_HEADER, HeaderValue::from_static("sekret"));

        assert!(has_service_key(&headers, Some("sekret")));
        assert!(!has_service_key(&headers, Some("other!")));
        assert!(!has_service_key(&headers, None));
        assert!(!has_service_key(&HeaderMap::new(), Some("sekret")));
    }
}
