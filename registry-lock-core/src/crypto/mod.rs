//! Registry lock password hashing
//!
//! PBKDF2-HMAC-SHA256 with a random per-contact salt. Hashes are stored as
//! `v<version>$<base64>`; the salt is stored base64 encoded next to it.

mod versions;

pub use versions::{get_current_iterations, get_pbkdf2_iterations, CURRENT_HASH_VERSION};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac_array;
use rand::RngCore;
use sha2::Sha256;

const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    pbkdf2_hmac_array::<Sha256, HASH_LENGTH>(password.as_bytes(), salt, iterations)
}

/// Hash a password with a fresh salt.
///
/// # Returns
/// Returns (`salt_base64`, `versioned_hash`) tuple
#[must_use]
pub fn hash_password(password: &str) -> (String, String) {
    let mut salt = [0u8; SALT_LENGTH];
    rand::rng().fill_bytes(&mut salt);

    let hash = derive(password, &salt, get_current_iterations());
    (
        BASE64.encode(salt),
        format!("v{CURRENT_HASH_VERSION}${}", BASE64.encode(hash)),
    )
}

/// Check `password` against a stored salt and versioned hash.
///
/// Malformed or unknown-version hashes never match.
#[must_use]
pub fn verify_password(password: &str, salt_b64: &str, stored_hash: &str) -> bool {
    let Some((version, hash_b64)) = stored_hash
        .strip_prefix('v')
        .and_then(|rest| rest.split_once('$'))
    else {
        return false;
    };
    let Some(iterations) = version.parse().ok().and_then(get_pbkdf2_iterations) else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt_b64), BASE64.decode(hash_b64)) else {
        return false;
    };

    constant_time_eq(&derive(password, &salt, iterations), &expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
