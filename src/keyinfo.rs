//! Key analysis: bit length and fingerprint of an offered public key, plus the
//! [`CollectedKey`] record kept for every offer.

use md5::{Digest, Md5};
use russh::keys::ssh_key::public::{EcdsaPublicKey, KeyData};
use russh::keys::ssh_key::Mpint;
use russh::keys::{PublicKey, PublicKeyBase64};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key type not supported: {0}")]
    UnsupportedKeyType(String),
    #[error("ECDSA curve not supported: {0:?}")]
    UnsupportedCurve(String),
    #[error("ECDSA point is not a valid point on {0}")]
    InvalidPoint(String),
    #[error("malformed key encoding: {0}")]
    Malformed(String),
}

/// A public key offered by a client, as held in the session registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedKey {
    key: PublicKey,
    algorithm: String,
    /// Set during presentation when the key matches the blacklist.
    pub blacklisted: bool,
}

impl CollectedKey {
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self {
            algorithm: key.algorithm().as_str().to_string(),
            key: key.clone(),
            blacklisted: false,
        }
    }

    /// Decode the SSH wire encoding of a public key.
    pub fn from_wire(blob: &[u8]) -> Result<Self, KeyError> {
        let key = PublicKey::from_bytes(blob).map_err(|e| KeyError::Malformed(e.to_string()))?;
        Ok(Self::from_public_key(&key))
    }

    /// Parse an authorized_keys-style line (`type base64 [comment]`).
    ///
    /// The declared type must agree with the algorithm inside the blob.
    pub fn from_authorized_line(line: &str) -> anyhow::Result<Self> {
        let mut fields = line.split_whitespace();
        let (declared, encoded) = match (fields.next(), fields.next()) {
            (Some(declared), Some(encoded)) => (declared, encoded),
            _ => anyhow::bail!("invalid authorized_key format: {}", line),
        };
        let key = russh::keys::parse_public_key_base64(encoded)
            .map_err(|e| anyhow::anyhow!("failed to parse public key: {}", e))?;
        let collected = Self::from_public_key(&key);
        if collected.algorithm != declared {
            anyhow::bail!(
                "key type mismatch: line declares {}, key is {}",
                declared,
                collected.algorithm
            );
        }
        Ok(collected)
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.key
    }

    /// SSH wire encoding, the input of the fingerprint.
    pub fn wire_bytes(&self) -> Vec<u8> {
        self.key.public_key_bytes()
    }

    pub fn bit_length(&self) -> Result<usize, KeyError> {
        bit_length(&self.key)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.wire_bytes())
    }

    /// Canonical single-line form, `<type> <base64>`, without a comment.
    pub fn canonical(&self) -> String {
        format!("{} {}", self.algorithm, self.key.public_key_base64())
    }
}

/// Compute the algorithm-specific size of a key.
///
/// RSA and DSA report the bit length of the modulus / prime `P`; ECDSA reports the
/// nominal size of the named curve once the encoded point is validated on it.
pub fn bit_length(key: &PublicKey) -> Result<usize, KeyError> {
    match key.key_data() {
        KeyData::Rsa(rsa) => mpint_bits(&rsa.n, "RSA modulus"),
        KeyData::Dsa(dsa) => mpint_bits(&dsa.p, "DSA prime"),
        KeyData::Ecdsa(ecdsa) => ecdsa_bit_length(ecdsa),
        _ => {
            let algorithm = key.algorithm();
            let name = algorithm.as_str();
            match name.strip_prefix("ecdsa-sha2-") {
                Some(curve) => Err(KeyError::UnsupportedCurve(curve.to_string())),
                None => Err(KeyError::UnsupportedKeyType(name.to_string())),
            }
        }
    }
}

fn mpint_bits(value: &Mpint, field: &str) -> Result<usize, KeyError> {
    let magnitude = value
        .as_positive_bytes()
        .ok_or_else(|| KeyError::Malformed(format!("{} is negative", field)))?;
    Ok(magnitude_bits(magnitude))
}

/// Bit length of a big-endian unsigned magnitude.
fn magnitude_bits(bytes: &[u8]) -> usize {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    match bytes[start..].first() {
        None => 0,
        Some(first) => (bytes.len() - start - 1) * 8 + (8 - first.leading_zeros() as usize),
    }
}

fn ecdsa_bit_length(ecdsa: &EcdsaPublicKey) -> Result<usize, KeyError> {
    let curve = ecdsa.curve();
    let point = ecdsa.as_sec1_bytes();
    let invalid = || KeyError::InvalidPoint(curve.as_str().to_string());

    // Only the uncompressed SEC1 form is valid in SSH key blobs
    if point.first() != Some(&0x04) {
        return Err(invalid());
    }
    let (bits, on_curve) = match ecdsa {
        EcdsaPublicKey::NistP256(_) => (256, p256::PublicKey::from_sec1_bytes(point).is_ok()),
        EcdsaPublicKey::NistP384(_) => (384, p384::PublicKey::from_sec1_bytes(point).is_ok()),
        EcdsaPublicKey::NistP521(_) => (521, p521::PublicKey::from_sec1_bytes(point).is_ok()),
    };
    if !on_curve {
        return Err(invalid());
    }
    Ok(bits)
}

/// MD5 over the raw wire encoding, as colon-separated lowercase hex pairs.
pub fn fingerprint(blob: &[u8]) -> String {
    let digest = Md5::digest(blob);
    digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}
