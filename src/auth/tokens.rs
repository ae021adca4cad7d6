//! Single-use secrets for invitations and password resets.
//!
//! The plaintext secret only ever leaves the process in a mail link. The
//! database stores its SHA-256 digest and lookups go through the digest.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::AppError;

const SECRET_BYTES: usize = 32;

pub fn generate_secret() -> Result<String, AppError> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to generate secret: {e}")))?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

pub fn hash_secret(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}
