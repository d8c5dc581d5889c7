//! Per-user signing key derivation.
//!
//! Tokens are not signed with the master secret directly. Each user's
//! signing key is derived from their stored password hash, so a password
//! change rotates the key and silently invalidates every token previously
//! issued to that user, with no ledger writes involved.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const PBKDF2_ITERATIONS: u32 = 100_000;
const DERIVED_KEY_LEN: usize = 32;
const SALT_LEN: usize = 16;

/// Derive the HS256 signing key for one user.
///
/// Pure function of `(user_id, password_hash, master_key)`:
/// - salt = first 16 bytes of SHA-256 over the user id string
/// - PBKDF2-HMAC-SHA256, 100 000 iterations, 32-byte output, over the
///   stored password-hash bytes
/// - HMAC-SHA256 of the derived key under the process-wide master secret
/// - final key = base64 of that digest
pub fn derive_signing_key(user_id: Uuid, password_hash: &str, master_key: &[u8]) -> String {
    let salt = user_salt(user_id);

    let mut derived = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(
        password_hash.as_bytes(),
        &salt,
        PBKDF2_ITERATIONS,
        &mut derived,
    );

    let mut mac = Hmac::<Sha256>::new_from_slice(master_key)
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(&derived);

    STANDARD.encode(mac.finalize().into_bytes())
}

fn user_salt(user_id: Uuid) -> [u8; SALT_LEN] {
    let digest = Sha256::digest(user_id.to_string().as_bytes());
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&digest[..SALT_LEN]);
    salt
}
