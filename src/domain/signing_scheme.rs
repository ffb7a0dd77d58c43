use std::fs;
use std::path::Path;

use base64::engine::general_purpose::{STANDARD as B64_STD, URL_SAFE_NO_PAD as B64_URL};
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use thiserror::Error;
use x509_parser::parse_x509_certificate;

/// Minimum entropy for a shared secret: 256 bits once base64-decoded.
const MIN_SECRET_BYTES: usize = 32;

/// Signing and verification key material, resolved once at startup from
/// configuration. The family is fixed by the configured algorithm name;
/// there is no runtime fallback between families and no mutation after
/// construction, so the scheme is shared freely across workers.
pub enum SigningScheme {
    Symmetric {
        algorithm: Algorithm,
        encoding: EncodingKey,
        decoding: DecodingKey,
    },
    Asymmetric {
        algorithm: Algorithm,
        encoding: EncodingKey,
        decoding: DecodingKey,
    },
}

impl std::fmt::Debug for SigningScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningScheme::Symmetric { algorithm, .. } => f
                .debug_struct("SigningScheme::Symmetric")
                .field("algorithm", algorithm)
                .finish_non_exhaustive(),
            SigningScheme::Asymmetric { algorithm, .. } => f
                .debug_struct("SigningScheme::Asymmetric")
                .field("algorithm", algorithm)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("shared secret is not valid base64")]
    SecretEncoding,
    #[error("shared secret must decode to at least {MIN_SECRET_BYTES} bytes, got {0}")]
    SecretTooShort(usize),
    #[error("failed to read key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed PEM in {path}: {reason}")]
    MalformedPem { path: String, reason: String },
    #[error("keystore {path} is missing a {block} block")]
    MissingKeystoreBlock { path: String, block: &'static str },
    #[error("failed to decrypt keystore private key (wrong password?): {0}")]
    KeystoreDecrypt(String),
    #[error("certificate in {path} does not carry a usable RSA public key: {reason}")]
    BadCertificate { path: String, reason: String },
}

impl SigningScheme {
    /// Shared-secret family (HS*). The secret is accepted in URL-safe or
    /// standard base64 and must carry at least 256 bits.
    pub fn from_secret_b64(algorithm: Algorithm, secret_b64: &str) -> Result<Self, KeyError> {
        let secret = decode_b64_any(secret_b64).map_err(|_| KeyError::SecretEncoding)?;
        if secret.len() < MIN_SECRET_BYTES {
            return Err(KeyError::SecretTooShort(secret.len()));
        }
        Ok(SigningScheme::Symmetric {
            algorithm,
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
        })
    }

    /// Public/private family (RS*) from two PEM files: a private key for
    /// signing and a public key for verification.
    pub fn from_pem_files(
        algorithm: Algorithm,
        private_key_file: &str,
        public_key_file: &str,
    ) -> Result<Self, KeyError> {
        let private_pem = read_file(private_key_file)?;
        let public_pem = read_file(public_key_file)?;

        let encoding = EncodingKey::from_rsa_pem(&private_pem).map_err(|e| {
            KeyError::MalformedPem {
                path: private_key_file.to_owned(),
                reason: e.to_string(),
            }
        })?;
        let decoding = DecodingKey::from_rsa_pem(&public_pem).map_err(|e| {
            KeyError::MalformedPem {
                path: public_key_file.to_owned(),
                reason: e.to_string(),
            }
        })?;

        Ok(SigningScheme::Asymmetric {
            algorithm,
            encoding,
            decoding,
        })
    }

    /// Public/private family (RS*) from a password-protected keystore: a
    /// PEM bundle holding an encrypted PKCS#8 private key and a
    /// certificate. The verification key is the certificate's subject
    /// public key.
    pub fn from_keystore(
        algorithm: Algorithm,
        keystore_file: &str,
        password: &str,
    ) -> Result<Self, KeyError> {
        let bytes = read_file(keystore_file)?;
        let blocks = pem::parse_many(&bytes).map_err(|e| KeyError::MalformedPem {
            path: keystore_file.to_owned(),
            reason: e.to_string(),
        })?;

        let key_block = blocks
            .iter()
            .find(|b| b.tag() == "ENCRYPTED PRIVATE KEY")
            .ok_or(KeyError::MissingKeystoreBlock {
                path: keystore_file.to_owned(),
                block: "ENCRYPTED PRIVATE KEY",
            })?;

        let encrypted = pkcs8::EncryptedPrivateKeyInfo::try_from(key_block.contents())
            .map_err(|e| KeyError::KeystoreDecrypt(e.to_string()))?;
        let decrypted = encrypted
            .decrypt(password)
            .map_err(|e| KeyError::KeystoreDecrypt(e.to_string()))?;
        let private_key = RsaPrivateKey::from_pkcs8_der(decrypted.as_bytes())
            .map_err(|e| KeyError::KeystoreDecrypt(e.to_string()))?;
        let private_der = private_key
            .to_pkcs1_der()
            .map_err(|e| KeyError::KeystoreDecrypt(e.to_string()))?;
        let encoding = EncodingKey::from_rsa_der(private_der.as_bytes());

        let cert_block = blocks.iter().find(|b| b.tag() == "CERTIFICATE").ok_or(
            KeyError::MissingKeystoreBlock {
                path: keystore_file.to_owned(),
                block: "CERTIFICATE",
            },
        )?;
        let (_, certificate) =
            parse_x509_certificate(cert_block.contents()).map_err(|e| KeyError::BadCertificate {
                path: keystore_file.to_owned(),
                reason: e.to_string(),
            })?;
        let public_der = certificate.public_key().subject_public_key.data.as_ref();
        // Confirm the certificate carries an RSA key before handing the
        // bytes to the verifier, which would only fail per-request.
        rsa::RsaPublicKey::from_pkcs1_der(public_der).map_err(|e| KeyError::BadCertificate {
            path: keystore_file.to_owned(),
            reason: e.to_string(),
        })?;
        let decoding = DecodingKey::from_rsa_der(public_der);

        Ok(SigningScheme::Asymmetric {
            algorithm,
            encoding,
            decoding,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            SigningScheme::Symmetric { algorithm, .. }
            | SigningScheme::Asymmetric { algorithm, .. } => *algorithm,
        }
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        match self {
            SigningScheme::Symmetric { encoding, .. }
            | SigningScheme::Asymmetric { encoding, .. } => encoding,
        }
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        match self {
            SigningScheme::Symmetric { decoding, .. }
            | SigningScheme::Asymmetric { decoding, .. } => decoding,
        }
    }
}

fn read_file(path: &str) -> Result<Vec<u8>, KeyError> {
    fs::read(Path::new(path)).map_err(|source| KeyError::Io {
        path: path.to_owned(),
        source,
    })
}

// Try URL-safe (no padding) first, then standard.
fn decode_b64_any(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    B64_URL.decode(s).or_else(|_| B64_STD.decode(s))
}
