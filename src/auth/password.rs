use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{debug, error};

use crate::error::AppError;

/// Argon2id with the crate's default parameters and a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AppError::internal(format!("password hashing failed: {e}"))
        })?
        .to_string();
    Ok(hash)
}

/// False on mismatch and on a malformed or unsupported hash; never errors.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "argon2 parse hash error");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

lazy_static! {
    /// Verified in place of a stored hash when no account matches, so a miss
    /// costs the same Argon2 work as a mismatch.
    static ref DUMMY_HASH: String =
        hash_password("no-such-account").expect("argon2 hashes a constant input");
}

/// Like [`verify_password`], but an absent hash still runs a full verify
/// against [`DUMMY_HASH`] and then reports a mismatch.
pub fn verify_stored(plain: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(hash) => verify_password(plain, hash),
        None => {
            let _ = verify_password(plain, &DUMMY_HASH);
            false
        }
    }
}

/// Runs [`hash_password`] on the blocking pool.
pub async fn spawn_hash(plain: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| AppError::internal(format!("password hashing task failed: {e}")))?
}

/// Runs [`verify_stored`] on the blocking pool.
pub async fn spawn_verify(plain: String, stored: Option<String>) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_stored(&plain, stored.as_deref()))
        .await
        .map_err(|e| AppError::internal(format!("password verify task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn verify_is_false_on_malformed_hash() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("pw123").unwrap();
        let b = hash_password("pw123").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn dummy_hash_costs_the_same_as_a_real_one() {
        let real = hash_password("pw123").unwrap();
        let real = PasswordHash::new(&real).unwrap();
        let dummy = PasswordHash::new(&DUMMY_HASH).unwrap();
        assert_eq!(dummy.algorithm, real.algorithm);
        assert_eq!(dummy.params, real.params);
    }

    #[test]
    fn missing_hash_never_verifies() {
        assert!(!verify_stored("no-such-account", None));
        assert!(!verify_stored("pw123", None));
        let hash = hash_password("pw123").unwrap();
        assert!(verify_stored("pw123", Some(&hash)));
    }

    #[tokio::test]
    async fn blocking_pool_wrappers_match_sync_results() {
        let hash = spawn_hash("pw123".into()).await.unwrap();
        assert!(spawn_verify("pw123".into(), Some(hash.clone())).await.unwrap());
        assert!(!spawn_verify("nope".into(), Some(hash)).await.unwrap());
        assert!(!spawn_verify("pw123".into(), None).await.unwrap());
    }
}
