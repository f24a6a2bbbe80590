//! Golden test vectors for deterministic verification.
//!
//! Published SHA-256 and AES-256-GCM answers. Every client that reads
//! documents from the same ledger must agree on these bytes, so they are
//! kept as JSON that other implementations can load verbatim.

use serde::{Deserialize, Serialize};

use sealdoc_core::{ContentDigest, Iv, IV_LEN};
use sealdoc_crypto::{decrypt, ContentKey, KEY_LEN};

/// A golden test vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub case: VectorCase,
}

/// Inputs and expected output of one vector. All byte strings are hex.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorCase {
    /// Content digest over raw bytes.
    Sha256 { input: String, digest: String },

    /// Sealed content. `ciphertext` carries the 16-byte tag at the end.
    AesGcm {
        key: String,
        iv: String,
        plaintext: String,
        ciphertext: String,
    },
}

const VECTORS_JSON: &str = r#"[
  {
    "name": "sha256-empty",
    "description": "Digest of the empty ciphertext",
    "kind": "sha256",
    "input": "",
    "digest": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
  },
  {
    "name": "sha256-abc",
    "description": "FIPS 180-2 one-block message",
    "kind": "sha256",
    "input": "616263",
    "digest": "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
  },
  {
    "name": "sha256-quick-brown-fox",
    "description": "Pangram",
    "kind": "sha256",
    "input": "54686520717569636b2062726f776e20666f78206a756d7073206f76657220746865206c617a7920646f67",
    "digest": "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592"
  },
  {
    "name": "aes256gcm-empty",
    "description": "Zero key, zero nonce, empty plaintext: tag only",
    "kind": "aes_gcm",
    "key": "0000000000000000000000000000000000000000000000000000000000000000",
    "iv": "000000000000000000000000",
    "plaintext": "",
    "ciphertext": "530f8afbc74536b9a963b4f1c4cb738b"
  },
  {
    "name": "aes256gcm-one-block",
    "description": "Zero key, zero nonce, one zero block",
    "kind": "aes_gcm",
    "key": "0000000000000000000000000000000000000000000000000000000000000000",
    "iv": "000000000000000000000000",
    "plaintext": "00000000000000000000000000000000",
    "ciphertext": "cea7403d4d606b6e074ec5d3baf39d18d0d1c8a799996bf0265b98b5d48ab919"
  },
  {
    "name": "aes256gcm-four-blocks",
    "description": "GCM reference test case 15",
    "kind": "aes_gcm",
    "key": "feffe9928665731c6d6a8f9467308308feffe9928665731c6d6a8f9467308308",
    "iv": "cafebabefacedbaddecaf888",
    "plaintext": "d9313225f88406e5a55909c5aff5269a86a7a9531534f7da2e4c303d8a318a721c3c0c95956809532fcf0e2449a6b525b16aedf5aa0de657ba637b391aafd255",
    "ciphertext": "522dc1f099567d07f47f37a32a84427d643a8cdcbfe5c0c97598a2bd2555d1aa8cb08e48590dbb3da7b08b1056828838c5f61e6393ba7a0abcc9f662898015adb094dac5d93471bdec1a502270e3cc6c"
  }
]"#;

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    serde_json::from_str(VECTORS_JSON).expect("embedded vectors must parse")
}

/// Check one vector against this implementation.
///
/// Returns whether the output matched, or why the vector could not be
/// evaluated.
pub fn check_vector(vector: &GoldenVector) -> Result<bool, String> {
    match &vector.case {
        VectorCase::Sha256 { input, digest } => {
            let input = hex::decode(input).map_err(|e| e.to_string())?;
            Ok(hex::encode(ContentDigest::compute(&input).as_bytes()) == *digest)
        }
        VectorCase::AesGcm {
            key,
            iv,
            plaintext,
            ciphertext,
        } => {
            let key: [u8; KEY_LEN] = decode_array(key)?;
            let iv: [u8; IV_LEN] = decode_array(iv)?;
            let plaintext = hex::decode(plaintext).map_err(|e| e.to_string())?;
            let ciphertext = hex::decode(ciphertext).map_err(|e| e.to_string())?;

            let opened = decrypt(&ciphertext, &ContentKey::from_bytes(key), &Iv::from_bytes(iv))
                .map_err(|e| e.to_string())?;
            Ok(opened == plaintext)
        }
    }
}

fn decode_array<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let bytes = hex::decode(s).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("expected {} bytes, got {}", N, b.len()))
}

/// Verify all golden vectors.
///
/// Returns `(name, matched, detail)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| match check_vector(v) {
            Ok(matched) => (v.name.clone(), matched, String::new()),
            Err(e) => (v.name.clone(), false, e),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        let results = verify_all_vectors();
        assert_eq!(results.len(), 6);

        for (name, matched, detail) in results {
            assert!(matched, "vector '{}' failed: {}", name, detail);
        }
    }

    #[test]
    fn test_corrupted_vector_fails() {
        let mut vector = all_vectors()
            .into_iter()
            .find(|v| v.name == "aes256gcm-one-block")
            .unwrap();

        if let VectorCase::AesGcm { ciphertext, .. } = &mut vector.case {
            ciphertext.replace_range(0..2, "cf");
        }
        assert!(check_vector(&vector).is_err());
    }

    #[test]
    fn test_vectors_reserialize() {
        let vectors = all_vectors();
        let json = serde_json::to_string(&vectors).unwrap();
        let back: Vec<GoldenVector> = serde_json::from_str(&json).unwrap();

        assert_eq!(back.len(), vectors.len());
        assert!(json.contains("\"kind\":\"aes_gcm\""));
    }
}
