//! Session tokens.
//!
//! The cookie carries 32 random bytes as hex; the database only ever sees the
//! SHA-256 digest of that string.

use chatbot_core::auth::hasher::TokenGenerator;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// OS-random tokens with SHA-256 digests.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenGenerator;

impl RandomTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn generate_token(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex_encode(&bytes)
    }

    fn digest(&self, token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
