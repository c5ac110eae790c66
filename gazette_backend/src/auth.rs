use crate::database::models::{AuthorRecord, SessionRecord};
use crate::database::repositories::{AuthorRepository, SessionRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::{anyhow, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username may not be empty")]
    EmptyUsername,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub bio: Option<String>,
    pub created_at: String,
}

impl AuthorSummary {
    pub fn from_record(record: AuthorRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            bio: record.bio,
            created_at: record.created_at,
        }
    }
}

/// A freshly minted bearer session plus the identity behind it.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub author: AuthorSummary,
}

#[derive(Clone)]
pub struct AuthService {
    database: Database,
}

impl AuthService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn register(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::EmptyUsername);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let password_hash = hash_password(password)?;
        let record = AuthorRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            bio: None,
            created_at: now_utc_iso(),
        };

        let session = self.database.with_repositories(|repos| {
            if repos.authors().get_by_username(&record.username)?.is_some() {
                return Ok(None);
            }
            repos.authors().create(&record)?;
            let session = SessionRecord {
                token: Uuid::new_v4().to_string(),
                author_id: record.id.clone(),
                created_at: now_utc_iso(),
            };
            repos.sessions().create(&session)?;
            Ok(Some(session))
        })?;

        match session {
            Some(session) => Ok(AuthSession {
                token: session.token,
                author: AuthorSummary::from_record(record),
            }),
            None => Err(AuthError::UsernameTaken),
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let author = self
            .database
            .with_repositories(|repos| repos.authors().get_by_username(username.trim()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &author.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let session = SessionRecord {
            token: Uuid::new_v4().to_string(),
            author_id: author.id.clone(),
            created_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.sessions().create(&session))?;

        Ok(AuthSession {
            token: session.token,
            author: AuthorSummary::from_record(author),
        })
    }

    /// Deleting an unknown token is a no-op.
    pub fn logout(&self, token: &str) -> Result<()> {
        self.database
            .with_repositories(|repos| repos.sessions().delete(token))
    }

    /// Resolves a bearer token to the viewer behind it, if any.
    pub fn resolve(&self, token: &str) -> Result<Option<AuthorRecord>> {
        self.database.with_repositories(|repos| {
            let Some(session) = repos.sessions().get(token)? else {
                return Ok(None);
            };
            repos.authors().get(&session.author_id)
        })
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| anyhow!("stored password hash is malformed: {err}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_service() -> AuthService {
        AuthService::new(crate::database::open_in_memory())
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn register_login_and_resolve() {
        let service = setup_service();
        let registered = service.register("leo", "tolstoy-writes").unwrap();
        assert_eq!(registered.author.username, "leo");

        let viewer = service.resolve(&registered.token).unwrap().unwrap();
        assert_eq!(viewer.username, "leo");

        let login = service.login("leo", "tolstoy-writes").unwrap();
        assert_ne!(login.token, registered.token);

        service.logout(&login.token).unwrap();
        assert!(service.resolve(&login.token).unwrap().is_none());
        // the other session is untouched
        assert!(service.resolve(&registered.token).unwrap().is_some());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let service = setup_service();
        service.register("leo", "tolstoy-writes").unwrap();
        assert!(matches!(
            service.register("leo", "different-pass"),
            Err(AuthError::UsernameTaken)
        ));
    }

    #[test]
    fn bad_credentials_are_rejected() {
        let service = setup_service();
        service.register("leo", "tolstoy-writes").unwrap();
        assert!(matches!(
            service.login("leo", "not-the-password"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "whatever-pass"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.register("", "whatever-pass"),
            Err(AuthError::EmptyUsername)
        ));
        assert!(matches!(
            service.register("ana", "short"),
            Err(AuthError::WeakPassword)
        ));
    }
}
