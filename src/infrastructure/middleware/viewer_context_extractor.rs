// ViewerContext Extractor - handler-side access to the request viewer

use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::error::AppError;
use crate::infrastructure::middleware::viewer_context_middleware::{has_service_key, HasServiceKey};
use crate::infrastructure::viewer::ViewerContext;

/// Cheap-to-clone handle on the request's `ViewerContext`.
///
/// Derefs to `ViewerContext`, so handlers read `vc.user_id` or call `vc.require_user()?`
/// directly. Requires `viewer_context_middleware` on the route.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl Vc {
    pub fn new(vc: Arc<ViewerContext>) -> Self {
        Self(vc)
    }
}

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let vc = parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or_else(|| AppError::Internal("Viewer context middleware not installed".to_string()));

        async move { vc }
    }
}

/// Guard for privileged routes: the request must present the configured service key.
#[derive(Debug, Clone, Copy)]
pub struct ServiceCaller;

impl<S> FromRequestParts<S> for ServiceCaller
where
    S: HasServiceKey + Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = if has_service_key(&parts.headers, state.service_role_key()) {
            Ok(ServiceCaller)
        } else {
            Err(AppError::Forbidden("Service key required".to_string()))
        };

        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vc_deref() {
        let viewer = Arc::new(ViewerContext::authenticated(
            "test-request".to_string(),
            "user-1".to_string(),
            "tok".to_string(),
        ));
        let vc = Vc::new(viewer);

        assert_eq!(vc.request_id, "test-request");
        assert_eq!(vc.require_user().unwrap(), "user-1");
        assert_eq!(vc.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_anonymous_viewer_is_rejected_by_require_user() {
        let vc = Vc::new(Arc::new(ViewerContext::anonymous("r".to_string())));
        assert!(matches!(vc.require_user(), Err(AppError::Unauthorized(_))));
    }
}
