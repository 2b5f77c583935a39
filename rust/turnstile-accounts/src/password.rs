use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::AccountError;

/// The minimum length of an account secret, enforced before hashing
pub const MIN_SECRET_LENGTH: usize = 6;

/// Hash `secret` with Argon2id under a fresh random salt, producing a PHC
/// string that embeds the salt and cost parameters.
pub(crate) fn hash_secret(secret: &str) -> Result<String, AccountError> {
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(AccountError::PasswordTooShort);
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|_| AccountError::BadCredential)?;

    Ok(hash.to_string())
}

/// Verify `candidate` against a stored PHC hash string
pub(crate) fn verify_secret(stored: &str, candidate: &str) -> Result<(), AccountError> {
    let parsed = PasswordHash::new(stored).map_err(|_| AccountError::BadCredential)?;

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|_| AccountError::BadCredential)
}

#[cfg(test)]
mod tests {
    use super::{hash_secret, verify_secret};
    use crate::AccountError;

    #[test]
    fn it_verifies_the_original_secret_and_rejects_others() {
        let hash = hash_secret("hunter2!").expect("long enough");

        assert!(verify_secret(&hash, "hunter2!").is_ok());
        assert!(matches!(
            verify_secret(&hash, "hunter3!"),
            Err(AccountError::BadCredential)
        ));
    }

    #[test]
    fn it_rejects_short_secrets_before_hashing() {
        assert!(matches!(
            hash_secret("five5"),
            Err(AccountError::PasswordTooShort)
        ));
    }

    #[test]
    fn hashes_are_salted() {
        let one = hash_secret("hunter2!").expect("long enough");
        let two = hash_secret("hunter2!").expect("long enough");

        assert_ne!(one, two);
    }
}
