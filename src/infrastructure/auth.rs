// Authentication - password accounts and opaque session tokens

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentStore;
use crate::models::{Profile, UserRecord, UserSummary};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Account and session service. Sessions live in process memory.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn ContentStore>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn ContentStore>, session_ttl: Duration) -> Self {
        Self {
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl,
        }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn sign_up(&self, request: SignUpRequest) -> AppResult<Profile> {
        let email = request.email.trim().to_lowercase();
        let username = request.username.trim().to_string();

        if username.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        let user = UserRecord {
            id: id.clone(),
            email: email.clone(),
            password_hash: hash_password(&request.password)?,
            created_at: now,
        };
        let profile = Profile {
            id,
            username,
            email,
            avatar_url: None,
            bio: None,
            follower_count: 0,
            following_count: 0,
            created_at: now,
        };

        self.store.insert_user(&user, &profile).await?;
        info!(user_id = %profile.id, "User signed up");
        Ok(profile)
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Password sign-in rejected");
            return Err(AppError::Unauthorized("Invalid email or password".to_string()));
        }

        let session = Session {
            token: uuid::Uuid::new_v4().simple().to_string(),
            user_id: user.id,
            expires_at: Utc::now() + chrono::Duration::seconds(self.session_ttl.as_secs() as i64),
        };
        let swept = {
            let mut sessions = self.sessions.write().await;
            let swept = retain_live(&mut sessions);
            sessions.insert(session.token.clone(), session.clone());
            swept
        };

        info!(user_id = %session.user_id, swept, "Session created");
        Ok(session)
    }

    /// Resolve a bearer token to its user id, dropping it if expired.
    pub async fn session_user(&self, token: &str) -> AppResult<String> {
        let session = self.sessions.read().await.get(token).cloned();
        match session {
            Some(session) if !session.is_expired() => Ok(session.user_id),
            Some(_) => {
                self.sessions.write().await.remove(token);
                Err(AppError::Unauthorized("Session expired".to_string()))
            }
            None => Err(AppError::Unauthorized("Session not found".to_string())),
        }
    }

    pub async fn current_user(&self, token: &str) -> AppResult<Profile> {
        let user_id = self.session_user(token).await?;
        self.store
            .get_profile(&user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))
    }

    /// Drop every expired session; returns how many went.
    pub async fn sweep_expired(&self) -> usize {
        let swept = retain_live(&mut *self.sessions.write().await);
        if swept > 0 {
            debug!(swept, "Expired sessions removed");
        }
        swept
    }

    /// Whether `user_id` still holds an unexpired session anywhere.
    pub async fn has_live_session(&self, user_id: &str) -> bool {
        self.sessions
            .read()
            .await
            .values()
            .any(|session| session.user_id == user_id && !session.is_expired())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn sign_out(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Revoke every session of `user_id`; returns how many were dropped.
    pub async fn sign_out_all(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.user_id != user_id);
        before - sessions.len()
    }

    /// Re-authentication check for sensitive operations.
    pub async fn verify_user_password(&self, user_id: &str, password: &str) -> AppResult<bool> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        verify_password(password, &user.password_hash)
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserSummary::from).collect())
    }
}

fn retain_live(sessions: &mut HashMap<String, Session>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired());
    before - sessions.len()
}

/// Hash password securely using Argon2
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verify password against hash
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDatabase;

    async fn service() -> AuthService {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        AuthService::new(Arc::new(db), Duration::from_secs(3600))
    }

    fn signup(email: &str, username: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            password: "correct horse".to_string(),
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_sign_in_and_current_user() {
        let auth = service().await;
        let profile = auth.sign_up(signup("Ada@Example.com", "ada")).await.unwrap();
        assert_eq!(profile.email, "ada@example.com");

        let session = auth
            .sign_in_with_password("ada@example.com", "correct horse")
            .await
            .unwrap();
        let me = auth.current_user(&session.token).await.unwrap();
        assert_eq!(me.id, profile.id);

        assert!(auth.sign_out(&session.token).await);
        assert!(matches!(
            auth.current_user(&session.token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_and_duplicates() {
        let auth = service().await;
        auth.sign_up(signup("bo@example.com", "bo")).await.unwrap();

        let wrong = auth.sign_in_with_password("bo@example.com", "not it at all").await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        let dup_email = auth.sign_up(signup("bo@example.com", "bo2")).await;
        assert!(matches!(dup_email, Err(AppError::Conflict(_))));
        let dup_name = auth.sign_up(signup("bo2@example.com", "bo")).await;
        assert!(matches!(dup_name, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_sign_up_validation_happens_before_storage() {
        let auth = service().await;
        let mut short = signup("cy@example.com", "cy");
        short.password = "short".to_string();
        assert!(matches!(auth.sign_up(short).await, Err(AppError::Validation(_))));
        assert!(matches!(
            auth.sign_up(signup("no-at-sign", "cy")).await,
            Err(AppError::Validation(_))
        ));
        assert!(auth.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_all_drops_every_session_of_user() {
        let auth = service().await;
        let profile = auth.sign_up(signup("di@example.com", "di")).await.unwrap();
        let a = auth.sign_in_with_password("di@example.com", "correct horse").await.unwrap();
        let b = auth.sign_in_with_password("di@example.com", "correct horse").await.unwrap();
        assert_ne!(a.token, b.token);

        assert!(auth.sign_out(&a.token).await);
        assert!(auth.has_live_session(&profile.id).await);
        let c = auth.sign_in_with_password("di@example.com", "correct horse").await.unwrap();

        assert_eq!(auth.sign_out_all(&profile.id).await, 2);
        assert!(!auth.has_live_session(&profile.id).await);
        assert!(auth.session_user(&c.token).await.is_err());
        assert!(auth.session_user(&a.token).await.is_err());
        assert!(auth.session_user(&b.token).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_swept() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let auth = AuthService::new(Arc::new(db), Duration::ZERO);
        auth.sign_up(signup("ed@example.com", "ed")).await.unwrap();

        for _ in 0..3 {
            auth.sign_in_with_password("ed@example.com", "correct horse").await.unwrap();
        }
        // Each sign-in clears the sessions that expired before it.
        assert_eq!(auth.session_count().await, 1);

        assert_eq!(auth.sweep_expired().await, 1);
        assert_eq!(auth.session_count().await, 0);
        assert_eq!(auth.sweep_expired().await, 0);
    }
}
