//! Password accounts and cookie sessions.
//!
//! Passwords are stored as Argon2 PHC strings. Session tokens are random,
//! handed to the browser once, and persisted only as their SHA-256 digest.

use std::sync::Arc;
use std::time::Duration;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CreateSessionParams, CreateUserParams, RepoError, SessionsRepo, UsersRepo,
};
use crate::domain::entities::UserRecord;
use crate::domain::error::DomainError;
use crate::domain::users::{validate_password, validate_username};

/// The user behind the current request, if any. Inserted into request
/// extensions by the session middleware.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<UserRecord>);

impl Viewer {
    pub fn user(&self) -> Option<&UserRecord> {
        self.0.as_ref()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("sign up form is invalid")]
    InvalidSignup(SignupFormErrors),
    #[error(transparent)]
    InvalidAccount(#[from] DomainError),
    #[error("username `{0}` is already taken")]
    UsernameTaken(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct SignupInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupFormErrors {
    pub username: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
}

impl SignupFormErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password1.is_none() && self.password2.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// A freshly opened session. `token` goes into the cookie and is not stored.
#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub user: UserRecord,
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        sessions: Arc<dyn SessionsRepo>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, AuthError> {
        validate_username(&new_user.username)?;
        validate_password(&new_user.password)?;

        let password_hash = hash_password(new_user.password).await?;
        let user = self
            .users
            .create_user(CreateUserParams {
                username: new_user.username.clone(),
                first_name: new_user.first_name.trim().to_string(),
                last_name: new_user.last_name.trim().to_string(),
                password_hash,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => AuthError::UsernameTaken(new_user.username),
                other => AuthError::Repo(other),
            })?;

        info!(
            target = "yatube::application::auth",
            user_id = user.id,
            username = %user.username,
            "user created"
        );
        Ok(user)
    }

    /// Validate the sign up form, create the account and log it in.
    pub async fn signup(&self, input: SignupInput) -> Result<SessionIssued, AuthError> {
        let mut errors = SignupFormErrors::default();
        let username = input.username.trim().to_string();

        if let Err(err) = validate_username(&username) {
            errors.username = Some(err.field_message());
        }
        if let Err(err) = validate_password(&input.password1) {
            errors.password1 = Some(err.field_message());
        }
        if input.password1 != input.password2 {
            errors.password2 = Some("the two password fields didn't match".to_string());
        }
        if errors.username.is_none() && self.users.find_user_by_username(&username).await?.is_some()
        {
            errors.username = Some("a user with that username already exists".to_string());
        }
        if !errors.is_empty() {
            return Err(AuthError::InvalidSignup(errors));
        }

        let user = self
            .create_user(NewUser {
                username,
                first_name: input.first_name,
                last_name: input.last_name,
                password: input.password1,
            })
            .await
            .map_err(|err| match err {
                AuthError::UsernameTaken(_) => AuthError::InvalidSignup(SignupFormErrors {
                    username: Some("a user with that username already exists".to_string()),
                    ..SignupFormErrors::default()
                }),
                other => other,
            })?;

        self.open_session(user).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<SessionIssued, AuthError> {
        let Some(credentials) = self.users.find_credentials(username.trim()).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), credentials.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        info!(
            target = "yatube::application::auth",
            user_id = credentials.user.id,
            "user logged in"
        );
        self.open_session(credentials.user).await
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete_session(&hash_token(token)).await?;
        Ok(())
    }

    pub async fn resolve_session(&self, token: &str) -> Result<Option<UserRecord>, AuthError> {
        let user = self
            .sessions
            .find_session_user(&hash_token(token), OffsetDateTime::now_utc())
            .await?;
        Ok(user)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AuthError> {
        let removed = self
            .sessions
            .purge_expired_sessions(OffsetDateTime::now_utc())
            .await?;
        Ok(removed)
    }

    async fn open_session(&self, user: UserRecord) -> Result<SessionIssued, AuthError> {
        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + self.session_ttl;
        self.sessions
            .create_session(CreateSessionParams {
                token_hash: hash_token(&token),
                user_id: user.id,
                expires_at,
            })
            .await?;

        Ok(SessionIssued {
            user,
            token,
            expires_at,
        })
    }
}

pub(crate) fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    let mut raw = [0u8; 32];
    raw[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    raw[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(raw)
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::PasswordHash(err.to_string()))
    })
    .await
    .map_err(|err| AuthError::PasswordHash(err.to_string()))?
}

async fn verify_password(password: String, stored_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored_hash).map_err(|err| AuthError::PasswordHash(err.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|err| AuthError::PasswordHash(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn password_hash_verifies_only_the_original() {
        let hash = hash_password("correct horse".to_string())
            .await
            .expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(
            verify_password("correct horse".to_string(), hash.clone())
                .await
                .expect("verify")
        );
        assert!(
            !verify_password("battery staple".to_string(), hash)
                .await
                .expect("verify")
        );
    }

    #[test]
    fn tokens_are_unique_and_hashed_to_hex() {
        let first = generate_token();
        let second = generate_token();
        assert_ne!(first, second);
        assert_eq!(first.len(), 43);

        let digest = hash_token(&first);
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_token(&first));
    }
}
