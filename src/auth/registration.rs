//! User registration.

use thiserror::Error;
use tracing::info;

use crate::auth::hash_password;
use crate::db::{Database, NewUser, User, UserRepository};
use crate::FilesError;

/// Registration-specific errors.
///
/// Display strings are the client-facing messages.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// No email supplied.
    #[error("Missing email")]
    MissingEmail,

    /// No password supplied.
    #[error("Missing password")]
    MissingPassword,

    /// Email already registered.
    #[error("Already exist")]
    EmailExists,

    /// Unexpected storage failure.
    #[error(transparent)]
    Internal(#[from] FilesError),
}

/// Registration request data.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRequest {
    /// Login email.
    pub email: Option<String>,
    /// Plaintext password.
    pub password: Option<String>,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// Register a new user.
///
/// Checks run in order: email present, password present, email unused.
/// Only the password digest is persisted.
pub async fn register(
    db: &Database,
    request: &RegistrationRequest,
) -> Result<User, RegistrationError> {
    let email = request
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or(RegistrationError::MissingEmail)?;
    let password = request
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(RegistrationError::MissingPassword)?;

    let repo = UserRepository::new(db.pool());
    if repo.email_exists(email).await? {
        return Err(RegistrationError::EmailExists);
    }

    let user = repo
        .create(&NewUser::new(email, hash_password(password)))
        .await
        .map_err(|e| match e {
            FilesError::Validation(_) => RegistrationError::EmailExists,
            other => RegistrationError::Internal(other),
        })?;

    info!("Registered user {} ({})", user.id, user.email);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;

    #[tokio::test]
    async fn test_register_success() {
        let db = Database::open_in_memory().await.unwrap();

        let user = register(&db, &RegistrationRequest::new("bob@dylan.com", "toto1234!"))
            .await
            .unwrap();

        assert_eq!(user.email, "bob@dylan.com");
        assert_ne!(user.password, "toto1234!");
        assert!(verify_password("toto1234!", &user.password));
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let db = Database::open_in_memory().await.unwrap();

        let no_email = RegistrationRequest {
            email: None,
            password: Some("pw".to_string()),
        };
        assert!(matches!(
            register(&db, &no_email).await,
            Err(RegistrationError::MissingEmail)
        ));

        let empty_email = RegistrationRequest::new("", "pw");
        assert!(matches!(
            register(&db, &empty_email).await,
            Err(RegistrationError::MissingEmail)
        ));

        let no_password = RegistrationRequest {
            email: Some("a@b.c".to_string()),
            password: None,
        };
        assert!(matches!(
            register(&db, &no_password).await,
            Err(RegistrationError::MissingPassword)
        ));
    }

    #[tokio::test]
    async fn test_register_missing_email_checked_first() {
        let db = Database::open_in_memory().await.unwrap();
        let result = register(&db, &RegistrationRequest::default()).await;
        assert_eq!(result.unwrap_err().to_string(), "Missing email");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let db = Database::open_in_memory().await.unwrap();
        let request = RegistrationRequest::new("dup@example.com", "pw");

        register(&db, &request).await.unwrap();
        let err = register(&db, &request).await.unwrap_err();

        assert!(matches!(err, RegistrationError::EmailExists));
        assert_eq!(err.to_string(), "Already exist");
    }
}
