//! Password hash version management
//!
//! Stored hashes carry their version as a `v<N>$` prefix so the iteration
//! count can be raised without invalidating existing passwords.
//! - Version 1: PBKDF2-HMAC-SHA256, 100,000 iterations

/// Version 1: PBKDF2-HMAC-SHA256, 100,000 iterations
const VERSION_1_ITERATIONS: u32 = 100_000;

/// Version used for newly hashed passwords
pub const CURRENT_HASH_VERSION: u32 = 1;

/// Get the number of iterations of the current version (calculated at compile time)
///
/// # Panics
/// Panics at compile time if `CURRENT_HASH_VERSION` does not map to a known iteration count.
#[allow(clippy::panic)]
pub const fn get_current_iterations() -> u32 {
    match get_pbkdf2_iterations(CURRENT_HASH_VERSION) {
        Some(iterations) => iterations,
        None => panic!("Invalid CURRENT_HASH_VERSION"),
    }
}

/// Get the number of PBKDF2 iterations for the specified hash version
pub const fn get_pbkdf2_iterations(version: u32) -> Option<u32> {
    match version {
        1 => Some(VERSION_1_ITERATIONS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_1_iterations() {
        assert_eq!(get_pbkdf2_iterations(1), Some(100_000));
    }

    #[test]
    fn unknown_version_returns_none() {
        assert_eq!(get_pbkdf2_iterations(0), None);
        assert_eq!(get_pbkdf2_iterations(99), None);
    }
}
