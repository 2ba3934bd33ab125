//! Token generation and fingerprinting
//!
//! A token plaintext is 16 bytes of cryptographically secure randomness,
//! base32-encoded without padding (26 characters). Only its SHA-256
//! fingerprint is ever persisted; being deterministic, the fingerprint doubles
//! as the indexed lookup key.

use data_encoding::BASE32_NOPAD;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes behind each token
const TOKEN_RANDOM_BYTES: usize = 16;

/// Generate a new token plaintext
///
/// The plaintext should be shown to the caller only once at issue time.
///
/// # Example
///
/// ```
/// use toyshelf::auth::generate_plaintext;
///
/// let plaintext = generate_plaintext();
/// assert_eq!(plaintext.len(), 26);
/// ```
pub fn generate_plaintext() -> String {
    let mut random_bytes = [0u8; TOKEN_RANDOM_BYTES];
    OsRng.fill_bytes(&mut random_bytes);

    BASE32_NOPAD.encode(&random_bytes)
}

/// Compute the stored fingerprint of a plaintext
///
/// Hex-encoded SHA-256; fixed size regardless of input.
///
/// # Example
///
/// ```
/// use toyshelf::auth::fingerprint;
///
/// let hash = fingerprint("QMGX3PJ3WLRL2PDA4XA2RTDIKA");
/// assert_eq!(hash.len(), 64);
/// ```
pub fn fingerprint(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)
}
