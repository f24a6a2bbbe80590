//! # Sealdoc Crypto
//!
//! Hybrid encryption primitives for shared documents.
//!
//! ## Encryption Model
//!
//! Documents use a two-layer key model:
//!
//! 1. **Content Key**: A random 256-bit AES-GCM key that encrypts the document once
//! 2. **Wrapped Keys**: The content key is encrypted to each recipient with RSA-OAEP
//!
//! This allows:
//! - Adding new recipients without re-encrypting content
//! - Storing the (large) ciphertext once, off-ledger
//! - Keeping only small wrapped keys in the access ledger
//!
//! Revocation clears a recipient's wrapped key. It cannot take back a key the
//! recipient already unwrapped; rotating the content key is the remedy.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealdoc_crypto::{ContentCipher, ContentKey, RecipientKeyPair, wrap_key, unwrap_key};
//!
//! let key = ContentKey::generate();
//! let sealed = ContentCipher::new(&key).encrypt(b"contract.pdf bytes").unwrap();
//!
//! let bob = RecipientKeyPair::generate(2048).unwrap();
//! let wrapped = wrap_key(&key, bob.public_key()).unwrap();
//!
//! let recovered = unwrap_key(&wrapped, bob.private_key()).unwrap();
//! let plaintext = ContentCipher::new(&recovered)
//!     .decrypt(&sealed.ciphertext, &sealed.iv)
//!     .unwrap();
//! ```

pub mod cipher;
pub mod error;
pub mod keys;
pub mod wrap;

pub use cipher::{decrypt, encrypt, ContentCipher, ContentKey, SealedContent, KEY_LEN, TAG_LEN};
pub use error::{CryptoError, Result};
pub use keys::{
    RecipientKeyPair, RecipientPrivateKey, RecipientPublicKey, MAX_MODULUS_BITS,
    MIN_MODULUS_BITS,
};
pub use wrap::{unwrap_key, wrap_key};
