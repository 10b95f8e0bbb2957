use once_cell::sync::Lazy;
use rand::Rng;
use serde::Serialize;

const PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()";
pub const DEFAULT_GENERATED_LENGTH: usize = 12;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Verified against when a login names no account
static ABSENT_USER_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password(&generate_secure_password(24)).ok());

/// Run a full verification that always fails
pub fn verify_absent_user(password: &str) -> bool {
    if let Some(hash) = ABSENT_USER_HASH.as_deref() {
        verify_password(password, hash);
    }
    false
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordStrength {
    pub strength: u8,
    pub feedback: Vec<&'static str>,
    pub is_strong: bool,
}

/// Score a password 0-5: length, upper, lower, digit, special
pub fn check_strength(password: &str) -> PasswordStrength {
    let checks: [(bool, &'static str); 5] = [
        (password.chars().count() >= 8, "Password should be at least 8 characters long."),
        (password.chars().any(|c| c.is_ascii_uppercase()), "Password should contain at least one uppercase letter."),
        (password.chars().any(|c| c.is_ascii_lowercase()), "Password should contain at least one lowercase letter."),
        (password.chars().any(|c| c.is_ascii_digit()), "Password should contain at least one number."),
        (password.chars().any(|c| !c.is_ascii_alphanumeric()), "Password should contain at least one special character."),
    ];

    let strength = checks.iter().filter(|(ok, _)| *ok).count() as u8;
    let feedback = checks.iter().filter(|(ok, _)| !ok).map(|(_, msg)| *msg).collect();

    PasswordStrength {
        strength,
        feedback,
        is_strong: strength >= 4,
    }
}

pub fn generate_secure_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}
