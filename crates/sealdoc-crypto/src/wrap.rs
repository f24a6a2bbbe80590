//! Per-recipient key wrapping.
//!
//! The content key is encrypted to each recipient with RSA-OAEP, using
//! SHA-256 for both the OAEP hash and MGF1. This matches WebCrypto's
//! `{ name: "RSA-OAEP", hash: "SHA-256" }`, so keys wrapped here unwrap in
//! a browser and vice versa.

use rsa::Oaep;
use sha2::Sha256;
use zeroize::Zeroize;

use sealdoc_core::WrappedKey;

use crate::cipher::ContentKey;
use crate::error::{CryptoError, Result};
use crate::keys::{RecipientPrivateKey, RecipientPublicKey};

/// Wrap a content key for one recipient.
///
/// OAEP padding is randomized: wrapping the same key twice gives different
/// bytes. Output length equals the recipient's modulus size.
pub fn wrap_key(key: &ContentKey, recipient: &RecipientPublicKey) -> Result<WrappedKey> {
    let wrapped = recipient
        .inner()
        .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha256>(), key.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(WrappedKey::new(wrapped))
}

/// Recover a content key with the recipient's private key.
///
/// Fails with [`CryptoError::KeyUnwrap`] if padding validation fails or the
/// recovered key is not exactly 256 bits.
pub fn unwrap_key(wrapped: &WrappedKey, private: &RecipientPrivateKey) -> Result<ContentKey> {
    let mut bytes = private
        .inner()
        .decrypt(Oaep::new::<Sha256>(), wrapped.as_bytes())
        .map_err(|_| CryptoError::KeyUnwrap)?;

    let key = ContentKey::from_slice(&bytes);
    bytes.zeroize();

    key.ok_or(CryptoError::KeyUnwrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::KEY_LEN;
    use crate::keys::RecipientKeyPair;
    use proptest::prelude::*;
    use std::sync::OnceLock;

    fn alice() -> &'static RecipientKeyPair {
        static PAIR: OnceLock<RecipientKeyPair> = OnceLock::new();
        PAIR.get_or_init(|| RecipientKeyPair::generate(2048).unwrap())
    }

    fn bob() -> &'static RecipientKeyPair {
        static PAIR: OnceLock<RecipientKeyPair> = OnceLock::new();
        PAIR.get_or_init(|| RecipientKeyPair::generate(2048).unwrap())
    }

    #[test]
    fn test_wrap_unwrap() {
        let key = ContentKey::generate();
        let wrapped = wrap_key(&key, alice().public_key()).unwrap();
        assert_eq!(wrapped.len(), 256);

        let recovered = unwrap_key(&wrapped, alice().private_key()).unwrap();
        assert_eq!(recovered.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_wrap_is_randomized() {
        let key = ContentKey::generate();
        let a = wrap_key(&key, alice().public_key()).unwrap();
        let b = wrap_key(&key, alice().public_key()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let key = ContentKey::generate();
        let wrapped = wrap_key(&key, alice().public_key()).unwrap();

        assert!(matches!(
            unwrap_key(&wrapped, bob().private_key()),
            Err(CryptoError::KeyUnwrap)
        ));
    }

    #[test]
    fn test_corrupted_wrap_fails() {
        let key = ContentKey::generate();
        let mut bytes = wrap_key(&key, alice().public_key()).unwrap().into_bytes();
        bytes[17] ^= 0x01;

        assert!(matches!(
            unwrap_key(&WrappedKey::new(bytes), alice().private_key()),
            Err(CryptoError::KeyUnwrap)
        ));
    }

    #[test]
    fn test_wrong_length_payload_fails() {
        // A well-formed OAEP ciphertext whose payload is not a 256-bit key.
        let short = alice()
            .public_key()
            .inner()
            .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha256>(), &[7u8; 16])
            .unwrap();

        assert!(matches!(
            unwrap_key(&WrappedKey::new(short), alice().private_key()),
            Err(CryptoError::KeyUnwrap)
        ));
    }

    #[test]
    fn test_empty_wrap_fails() {
        assert!(matches!(
            unwrap_key(&WrappedKey::new(Vec::new()), alice().private_key()),
            Err(CryptoError::KeyUnwrap)
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn wrap_roundtrip(bytes in any::<[u8; KEY_LEN]>()) {
            let key = ContentKey::from_bytes(bytes);
            let wrapped = wrap_key(&key, alice().public_key()).unwrap();
            let recovered = unwrap_key(&wrapped, alice().private_key()).unwrap();
            prop_assert_eq!(recovered.as_bytes(), &bytes);
        }
    }
}
