//! RSA private key generation and encoding.

use rcgen::{KeyPair, PKCS_RSA_SHA256};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;

use crate::domain::KeyEncoding;
use crate::errors::{Error, Result};
use crate::secrets::SecretString;

const PKCS1_PEM_LABEL: &str = "BEGIN RSA PRIVATE KEY";

/// Generate a fresh RSA private key of `bits` modulus size.
pub fn generate_private_key(bits: usize) -> Result<RsaPrivateKey> {
    let mut rng = rand::thread_rng();
    RsaPrivateKey::new(&mut rng, bits).map_err(|e| {
        Error::key_generation(format!("failed to generate {}-bit RSA key: {}", bits, e))
    })
}

/// PEM-encode a private key.
pub fn encode_private_key(key: &RsaPrivateKey, encoding: KeyEncoding) -> Result<SecretString> {
    let pem = match encoding {
        KeyEncoding::Pkcs1 => key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| Error::key_generation(format!("failed to encode PKCS#1 key: {}", e)))?,
        KeyEncoding::Pkcs8 => key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| Error::key_generation(format!("failed to encode PKCS#8 key: {}", e)))?,
    };
    Ok(SecretString::new(pem.as_str()))
}

/// Decode a PEM private key in either PKCS#1 or PKCS#8 form.
pub fn decode_private_key(pem: &str) -> Result<RsaPrivateKey> {
    let decoded = if pem.contains(PKCS1_PEM_LABEL) {
        RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| e.to_string())
    } else {
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| e.to_string())
    };
    decoded.map_err(|e| Error::key_generation(format!("failed to decode RSA private key: {}", e)))
}

/// Convert an RSA key into an rcgen key pair able to sign with SHA-256.
pub fn signing_key_pair(key: &RsaPrivateKey) -> Result<KeyPair> {
    let pkcs8 = key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| Error::signing(format!("failed to encode signing key: {}", e)))?;
    KeyPair::from_pem_and_sign_algo(pkcs8.as_str(), &PKCS_RSA_SHA256)
        .map_err(|e| Error::signing(format!("failed to load signing key: {}", e)))
}
