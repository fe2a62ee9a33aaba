//! Wallet Key Generation
//!
//! Produces a fresh keypair on demand. The generator is a trait so tests
//! can substitute a fixed credential; the default implementation derives
//! an ed25519 keypair from the OS RNG.

use quant_core::Result;

use crate::model::WalletCredential;

/// Keypair generator seam
pub trait WalletKeygen: Send + Sync {
    /// Generate a fresh keypair. Each call must yield new key material.
    fn generate(&self) -> Result<WalletCredential>;
}

/// Default ed25519 keypair generator.
///
/// Address is the 0x-prefixed hex of the public key; the private key is
/// the base58-encoded 64-byte secret||public keypair, matching the
/// tooling convention the trading backend accepts.
pub struct Ed25519Keygen;

impl WalletKeygen for Ed25519Keygen {
    fn generate(&self) -> Result<WalletCredential> {
        use ed25519_dalek::SigningKey;

        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();

        let public_key = format!("0x{}", hex::encode(verifying_key.as_bytes()));

        let mut keypair_bytes = [0u8; 64];
        keypair_bytes[..32].copy_from_slice(&signing_key.to_bytes());
        keypair_bytes[32..].copy_from_slice(verifying_key.as_bytes());
        let private_key = bs58::encode(&keypair_bytes).into_string();

        Ok(WalletCredential {
            public_key,
            private_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_credential_shape() {
        let credential = Ed25519Keygen.generate().unwrap();

        assert!(credential.public_key.starts_with("0x"));
        // 32-byte public key as hex plus the 0x prefix
        assert_eq!(credential.public_key.len(), 66);
        assert!(!credential.private_key.is_empty());
    }

    #[test]
    fn test_each_call_yields_fresh_keys() {
        let first = Ed25519Keygen.generate().unwrap();
        let second = Ed25519Keygen.generate().unwrap();

        assert_ne!(first.public_key, second.public_key);
        assert_ne!(first.private_key, second.private_key);
    }
}
