use crate::error::{AppError, AppResult};

/// Who is making the current request.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub token: Option<String>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        Self {
            request_id,
            user_id: None,
            token: None,
        }
    }

    pub fn authenticated(request_id: String, user_id: String, token: String) -> Self {
        Self {
            request_id,
            user_id: Some(user_id),
            token: Some(token),
        }
    }

    pub fn require_user(&self) -> AppResult<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
    }

    pub fn require_token(&self) -> AppResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
    }
}
