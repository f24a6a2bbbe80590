//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::OnceLock;

use sealdoc_core::Address;
use sealdoc_crypto::{RecipientKeyPair, RecipientPrivateKey, RecipientPublicKey};

/// Modulus size used for every fixture key.
pub const FIXTURE_KEY_BITS: usize = 2048;

const SLOTS: usize = 4;

static KEYS: [OnceLock<RecipientKeyPair>; SLOTS] = [
    OnceLock::new(),
    OnceLock::new(),
    OnceLock::new(),
    OnceLock::new(),
];

fn cached_keypair(slot: usize) -> &'static RecipientKeyPair {
    KEYS[slot].get_or_init(|| {
        RecipientKeyPair::generate(FIXTURE_KEY_BITS).expect("fixture key generation failed")
    })
}

/// A named party with a ledger address and an RSA key pair.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub name: &'static str,
    pub address: Address,
    pub keys: &'static RecipientKeyPair,
}

impl Principal {
    fn cached(name: &'static str, slot: usize, tag: u8) -> Self {
        Self {
            name,
            address: Address::from_bytes([tag; 20]),
            keys: cached_keypair(slot),
        }
    }

    /// The principal's public key.
    pub fn public_key(&self) -> &'static RecipientPublicKey {
        self.keys.public_key()
    }

    /// The principal's private key.
    pub fn private_key(&self) -> &'static RecipientPrivateKey {
        self.keys.private_key()
    }

    /// Address and public key, as taken by `reissue`.
    pub fn recipient(&self) -> (Address, RecipientPublicKey) {
        (self.address, self.public_key().clone())
    }
}

/// The usual document owner.
pub fn alice() -> Principal {
    Principal::cached("alice", 0, 0xA1)
}

/// The usual recipient.
pub fn bob() -> Principal {
    Principal::cached("bob", 1, 0xB0)
}

/// A second recipient.
pub fn carol() -> Principal {
    Principal::cached("carol", 2, 0xC4)
}

/// A party that is never granted anything.
pub fn mallory() -> Principal {
    Principal::cached("mallory", 3, 0x3A)
}

/// Route `tracing` output through the test harness.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principals_are_distinct() {
        let parties = [alice(), bob(), carol(), mallory()];

        for (i, a) in parties.iter().enumerate() {
            for b in &parties[i + 1..] {
                assert_ne!(a.address, b.address, "{} vs {}", a.name, b.name);
                assert_ne!(
                    a.public_key().to_der().unwrap(),
                    b.public_key().to_der().unwrap()
                );
            }
        }
    }

    #[test]
    fn test_keys_are_cached() {
        let first = alice().keys as *const RecipientKeyPair;
        let second = alice().keys as *const RecipientKeyPair;
        assert_eq!(first, second);
        assert_eq!(alice().public_key().modulus_bits(), FIXTURE_KEY_BITS);
    }
}
