//! Django-compatible password encoding.
//!
//! Produces `pbkdf2_sha256$<iterations>$<salt>$<base64 hash>`, the format
//! Django's default `PBKDF2PasswordHasher` stores in `auth_user.password`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::Sha256;

const ALGORITHM: &str = "pbkdf2_sha256";

/// Iteration count used by the Django release Cyclope runs on.
pub const ITERATIONS: u32 = 10_000;

/// Encode a password with a fresh random salt.
pub fn make_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    encode(password, &salt[..12], ITERATIONS)
}

/// Encode a password with an explicit salt and iteration count.
pub fn encode(password: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    format!(
        "{}${}${}${}",
        ALGORITHM,
        iterations,
        salt,
        STANDARD.encode(key)
    )
}

/// Check a password against an encoded value.
pub fn check_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(_)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    encode(password, salt, iterations) == encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_format() {
        let encoded = make_password("admin");
        let parts: Vec<&str> = encoded.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pbkdf2_sha256");
        assert_eq!(parts[1], "10000");
        assert_eq!(parts[2].len(), 12);
        // 32 byte digest -> 44 base64 chars
        assert_eq!(parts[3].len(), 44);
    }

    #[test]
    fn test_encode_is_deterministic_for_salt() {
        let a = encode("lètmein", "seasalt", 1000);
        let b = encode("lètmein", "seasalt", 1000);
        assert_eq!(a, b);
        assert_ne!(a, encode("lètmein", "pepper", 1000));
    }

    #[test]
    fn test_check_password() {
        let encoded = make_password("secreto");
        assert!(check_password("secreto", &encoded));
        assert!(!check_password("otro", &encoded));
        assert!(!check_password("secreto", "md5$x$y"));
        assert!(!check_password("secreto", "garbage"));
    }

    #[test]
    fn test_fresh_salts_differ() {
        assert_ne!(make_password("same"), make_password("same"));
    }
}
