use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

use crate::auth::AuthError;

/// Hash checked when the account does not exist, so both login failures cost the same.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("not-a-real-password-Aa1!").ok());

/// Argon2id with a random salt, encoded as a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash off the async runtime.
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// Verify a login attempt against the stored hash, if the account exists.
///
/// A missing account and a wrong password both end in
/// [`AuthError::InvalidCredentials`] after the same amount of hashing work.
pub async fn check_credentials(password: String, stored_hash: Option<String>) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        let (hash, exists) = match stored_hash {
            Some(hash) => (hash, true),
            None => match DUMMY_HASH.as_ref() {
                Some(hash) => (hash.clone(), false),
                None => return Err(AuthError::Hash("dummy hash unavailable".to_string())),
            },
        };

        let matches = verify_password(&password, &hash)?;
        if matches && exists {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Correct-Horse-1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Correct-Horse-1", &hash).unwrap());
        assert!(!verify_password("correct-horse-1", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("Same-Password-1").unwrap();
        let b = hash_password("Same-Password-1").unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_missing_account_and_wrong_password_fail_alike() {
        let hash = hash_password_blocking("Right-Password-1".to_string()).await.unwrap();

        let wrong = check_credentials("Wrong-Password-1".to_string(), Some(hash.clone())).await;
        let missing = check_credentials("Wrong-Password-1".to_string(), None).await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(missing, Err(AuthError::InvalidCredentials)));

        // Even the dummy password cannot log into a missing account
        let dummy = check_credentials("not-a-real-password-Aa1!".to_string(), None).await;
        assert!(matches!(dummy, Err(AuthError::InvalidCredentials)));

        assert!(check_credentials("Right-Password-1".to_string(), Some(hash)).await.is_ok());
    }
}
