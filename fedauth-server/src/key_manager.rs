use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use jsonwebtoken::{DecodingKey, EncodingKey};

/// Development fallback pair, used when no key material is configured.
const LOCALHOST_KEY: &[u8] = include_bytes!("../resources/localhost.key");
const LOCALHOST_CRT: &[u8] = include_bytes!("../resources/localhost.crt");

#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    #[error("failed to read key material from `{0}`: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
}

/// Handles the RS256 key pair: the signing key comes from a PEM private key
/// file, the verification key from an X.509 certificate. Loaded once and
/// kept behind a lock so the pair can be re-read without a restart.
pub struct KeyManager {
    key_path: Option<PathBuf>,
    cert_path: Option<PathBuf>,
    keys: RwLock<KeyPair>,
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("key_path", &self.key_path)
            .field("cert_path", &self.cert_path)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl KeyManager {
    /// Load the signing key and verification certificate, falling back to
    /// the bundled localhost pair for any path not configured.
    pub fn load(key_path: Option<PathBuf>, cert_path: Option<PathBuf>) -> Result<Self, KeyError> {
        let keys = read_pair(key_path.as_deref(), cert_path.as_deref())?;
        Ok(Self {
            key_path,
            cert_path,
            keys: RwLock::new(keys),
        })
    }

    /// Re-read the configured PEM files, replacing the in-memory pair. The
    /// old pair stays in place when reading fails.
    pub fn reload(&self) -> Result<(), KeyError> {
        let pair = read_pair(self.key_path.as_deref(), self.cert_path.as_deref())?;
        *self.keys.write().unwrap_or_else(|e| e.into_inner()) = pair;
        Ok(())
    }

    pub fn encoding_key(&self) -> EncodingKey {
        self.keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .encoding
            .clone()
    }

    pub fn decoding_key(&self) -> DecodingKey {
        self.keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .decoding
            .clone()
    }
}

fn read_pair(
    key_path: Option<&std::path::Path>,
    cert_path: Option<&std::path::Path>,
) -> Result<KeyPair, KeyError> {
    let key_pem = match key_path {
        Some(path) => fs::read(path).map_err(|e| KeyError::Read(path.to_path_buf(), e))?,
        None => LOCALHOST_KEY.to_vec(),
    };
    let cert_pem = match cert_path {
        Some(path) => fs::read(path).map_err(|e| KeyError::Read(path.to_path_buf(), e))?,
        None => LOCALHOST_CRT.to_vec(),
    };

    let encoding =
        EncodingKey::from_rsa_pem(&key_pem).map_err(|e| KeyError::InvalidKey(e.to_string()))?;
    let decoding = decoding_key_from_certificate(&cert_pem)?;

    Ok(KeyPair { encoding, decoding })
}

/// The verification key is distributed as a certificate; extract the RSA
/// public key from its SubjectPublicKeyInfo.
fn decoding_key_from_certificate(pem: &[u8]) -> Result<DecodingKey, KeyError> {
    let (_, parsed) = x509_parser::pem::parse_x509_pem(pem)
        .map_err(|e| KeyError::InvalidCertificate(e.to_string()))?;
    let certificate = parsed
        .parse_x509()
        .map_err(|e| KeyError::InvalidCertificate(e.to_string()))?;
    let public_key = certificate.public_key();

    Ok(DecodingKey::from_rsa_der(
        public_key.subject_public_key.data.as_ref(),
    ))
}
