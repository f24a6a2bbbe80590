//! Recipient key containers.
//!
//! Recipients exchange RSA keys out of band as SPKI (public) and PKCS#8
//! (private) documents, PEM or DER encoded. Keys are checked for algorithm
//! and size when they are loaded, so a constructed key is always usable for
//! RSA-OAEP wrapping.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

/// Smallest accepted modulus, in bits.
pub const MIN_MODULUS_BITS: usize = 2048;

/// Largest accepted modulus, in bits.
pub const MAX_MODULUS_BITS: usize = 4096;

fn check_modulus(bits: usize) -> Result<()> {
    if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
        return Err(CryptoError::InvalidKey(format!(
            "modulus of {} bits outside {}..={}",
            bits, MIN_MODULUS_BITS, MAX_MODULUS_BITS
        )));
    }
    Ok(())
}

/// A recipient's RSA public key, used to wrap content keys.
#[derive(Clone, PartialEq, Eq)]
pub struct RecipientPublicKey(RsaPublicKey);

impl RecipientPublicKey {
    /// Parse a PEM `PUBLIC KEY` (SPKI) document.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("SPKI PEM: {}", e)))?;
        Self::checked(key)
    }

    /// Parse a DER-encoded SPKI document.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let key = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| CryptoError::InvalidKey(format!("SPKI DER: {}", e)))?;
        Self::checked(key)
    }

    fn checked(key: RsaPublicKey) -> Result<Self> {
        check_modulus(key.size() * 8)?;
        Ok(Self(key))
    }

    /// Encode as a PEM `PUBLIC KEY` document.
    pub fn to_pem(&self) -> Result<String> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Encode as DER SPKI.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Modulus size in bits.
    pub fn modulus_bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Length of every key wrapped under this key, in bytes.
    pub fn wrapped_len(&self) -> usize {
        self.0.size()
    }

    pub(crate) fn inner(&self) -> &RsaPublicKey {
        &self.0
    }
}

impl std::fmt::Debug for RecipientPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecipientPublicKey(rsa-{})", self.modulus_bits())
    }
}

/// A recipient's RSA private key, used to unwrap content keys.
///
/// The underlying key material is zeroized on drop.
#[derive(Clone)]
pub struct RecipientPrivateKey(RsaPrivateKey);

impl RecipientPrivateKey {
    /// Parse a PEM `PRIVATE KEY` (PKCS#8) document.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("PKCS#8 PEM: {}", e)))?;
        Self::checked(key)
    }

    /// Parse a DER-encoded PKCS#8 document.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| CryptoError::InvalidKey(format!("PKCS#8 DER: {}", e)))?;
        Self::checked(key)
    }

    fn checked(key: RsaPrivateKey) -> Result<Self> {
        key.validate()
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        check_modulus(key.size() * 8)?;
        Ok(Self(key))
    }

    /// Encode as a PEM `PRIVATE KEY` document.
    pub fn to_pem(&self) -> Result<Zeroizing<String>> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Encode as DER PKCS#8.
    pub fn to_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.0
            .to_pkcs8_der()
            .map(|doc| Zeroizing::new(doc.as_bytes().to_vec()))
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// The matching public key.
    pub fn public_key(&self) -> RecipientPublicKey {
        RecipientPublicKey(RsaPublicKey::from(&self.0))
    }

    pub(crate) fn inner(&self) -> &RsaPrivateKey {
        &self.0
    }
}

impl std::fmt::Debug for RecipientPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecipientPrivateKey(rsa-{}, [REDACTED])", self.0.size() * 8)
    }
}

/// A freshly generated recipient key pair.
#[derive(Clone)]
pub struct RecipientKeyPair {
    private: RecipientPrivateKey,
    public: RecipientPublicKey,
}

impl RecipientKeyPair {
    /// Generate a key pair with the given modulus size.
    ///
    /// Generation is slow (hundreds of milliseconds at 2048 bits).
    pub fn generate(bits: usize) -> Result<Self> {
        check_modulus(bits)?;
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let private = RecipientPrivateKey(private);
        let public = private.public_key();
        Ok(Self { private, public })
    }

    /// Get the public half.
    pub fn public_key(&self) -> &RecipientPublicKey {
        &self.public
    }

    /// Get the private half.
    pub fn private_key(&self) -> &RecipientPrivateKey {
        &self.private
    }
}

impl std::fmt::Debug for RecipientKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecipientKeyPair({:?})", self.public)
    }
}
