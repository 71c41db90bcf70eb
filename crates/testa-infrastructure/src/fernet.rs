//! Fernet session-token decoding.
//!
//! A launch token is the URL-safe base64 encoding of a Fernet token whose
//! plaintext is the JSON [`SessionToken`]. Fernet layout:
//!
//! ```text
//! 0x80 | timestamp (u64 BE) | IV (16) | AES-128-CBC/PKCS7 ciphertext | HMAC-SHA256 (32)
//! ```
//!
//! The 32-byte key is split into a signing half (first 16 bytes) and an
//! encryption half (last 16 bytes). The HMAC covers everything before it and
//! is verified before any decryption happens. Token age is not checked.

use aes::Aes128;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use testa_core::TestaError;
use testa_core::token::{SessionToken, TokenDecoder};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

const VERSION: u8 = 0x80;
const IV_LEN: usize = 16;
const HEADER_LEN: usize = 1 + 8 + IV_LEN;
const TAG_LEN: usize = 32;
const BLOCK_LEN: usize = 16;

/// URL-safe alphabet, padded on encode, padding optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors that can occur while handling Fernet tokens.
#[derive(Debug, PartialEq, Eq)]
pub enum FernetError {
    /// Key is not URL-safe base64 of exactly 32 bytes.
    InvalidKey,
    /// Token is not base64 or too short to hold a Fernet frame.
    Malformed(&'static str),
    /// Version byte is not 0x80.
    UnsupportedVersion(u8),
    /// HMAC does not match: wrong key or tampered token.
    InvalidSignature,
    /// Ciphertext decrypted to invalid PKCS7 padding.
    InvalidPadding,
}

impl std::fmt::Display for FernetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FernetError::InvalidKey => write!(f, "Fernet key must be 32 bytes of url-safe base64"),
            FernetError::Malformed(what) => write!(f, "Malformed token: {}", what),
            FernetError::UnsupportedVersion(v) => write!(f, "Unsupported token version 0x{:02x}", v),
            FernetError::InvalidSignature => write!(f, "Token signature does not match"),
            FernetError::InvalidPadding => write!(f, "Token plaintext has invalid padding"),
        }
    }
}

impl std::error::Error for FernetError {}

/// A Fernet key (signing + encryption halves).
#[derive(Clone)]
pub struct FernetKey {
    signing: [u8; 16],
    encryption: [u8; 16],
}

impl FernetKey {
    /// Parses a URL-safe base64 encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, FernetError> {
        let bytes = URL_SAFE_LENIENT
            .decode(encoded.trim())
            .map_err(|_| FernetError::InvalidKey)?;
        if bytes.len() != 32 {
            return Err(FernetError::InvalidKey);
        }

        let mut signing = [0u8; 16];
        let mut encryption = [0u8; 16];
        signing.copy_from_slice(&bytes[..16]);
        encryption.copy_from_slice(&bytes[16..]);
        Ok(Self {
            signing,
            encryption,
        })
    }

    /// Generates a random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut signing = [0u8; 16];
        let mut encryption = [0u8; 16];
        rng.fill_bytes(&mut signing);
        rng.fill_bytes(&mut encryption);
        Self {
            signing,
            encryption,
        }
    }

    pub fn to_base64(&self) -> String {
        let mut bytes = Vec::with_capacity(32);
        bytes.extend_from_slice(&self.signing);
        bytes.extend_from_slice(&self.encryption);
        URL_SAFE_LENIENT.encode(bytes)
    }

    /// Encrypts `plaintext` with a random IV and the current time.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, FernetError> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.encrypt_with(plaintext, iv, now)
    }

    /// Encrypts with an explicit IV and timestamp.
    pub fn encrypt_with(
        &self,
        plaintext: &[u8],
        iv: [u8; IV_LEN],
        timestamp: u64,
    ) -> Result<String, FernetError> {
        let ciphertext = Aes128CbcEnc::new_from_slices(&self.encryption, &iv)
            .map_err(|_| FernetError::InvalidKey)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut frame = Vec::with_capacity(HEADER_LEN + ciphertext.len() + TAG_LEN);
        frame.push(VERSION);
        frame.extend_from_slice(&timestamp.to_be_bytes());
        frame.extend_from_slice(&iv);
        frame.extend_from_slice(&ciphertext);

        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(&self.signing).map_err(|_| FernetError::InvalidKey)?;
        mac.update(&frame);
        frame.extend_from_slice(&mac.finalize().into_bytes());

        Ok(URL_SAFE_LENIENT.encode(frame))
    }

    /// Verifies and decrypts a Fernet token.
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, FernetError> {
        let frame = URL_SAFE_LENIENT
            .decode(token.trim())
            .map_err(|_| FernetError::Malformed("not url-safe base64"))?;
        if frame.len() < HEADER_LEN + BLOCK_LEN + TAG_LEN {
            return Err(FernetError::Malformed("too short"));
        }
        if frame[0] != VERSION {
            return Err(FernetError::UnsupportedVersion(frame[0]));
        }

        let (signed, tag) = frame.split_at(frame.len() - TAG_LEN);
        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(&self.signing).map_err(|_| FernetError::InvalidKey)?;
        mac.update(signed);
        mac.verify_slice(tag)
            .map_err(|_| FernetError::InvalidSignature)?;

        let iv = &signed[1 + 8..HEADER_LEN];
        let ciphertext = &signed[HEADER_LEN..];
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(FernetError::Malformed("ciphertext is not block aligned"));
        }

        Aes128CbcDec::new_from_slices(&self.encryption, iv)
            .map_err(|_| FernetError::InvalidKey)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| FernetError::InvalidPadding)
    }
}

/// [`TokenDecoder`] for base64-wrapped Fernet tokens.
#[derive(Clone)]
pub struct FernetTokenDecoder {
    key: FernetKey,
}

impl FernetTokenDecoder {
    pub fn new(key: FernetKey) -> Self {
        Self { key }
    }

    /// Builds a decoder from the configured base64 key.
    pub fn from_base64_key(encoded: &str) -> Result<Self, TestaError> {
        FernetKey::from_base64(encoded)
            .map(Self::new)
            .map_err(|e| TestaError::config(e.to_string()))
    }

    /// Issues a launch token for `token`.
    pub fn encode(&self, token: &SessionToken) -> Result<String, TestaError> {
        let payload = serde_json::to_vec(token)?;
        let fernet = self
            .key
            .encrypt(&payload)
            .map_err(|e| TestaError::internal(e.to_string()))?;
        Ok(URL_SAFE_LENIENT.encode(fernet.as_bytes()))
    }
}

impl TokenDecoder for FernetTokenDecoder {
    fn decode(&self, data: &str) -> testa_core::Result<SessionToken> {
        let outer = URL_SAFE_LENIENT
            .decode(data.trim())
            .map_err(|_| TestaError::invalid_token("token is not url-safe base64"))?;
        let fernet = String::from_utf8(outer)
            .map_err(|_| TestaError::invalid_token("token does not wrap a Fernet token"))?;
        let plaintext = self
            .key
            .decrypt(&fernet)
            .map_err(|e| TestaError::invalid_token(e.to_string()))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| TestaError::invalid_token(format!("payload is not a session token: {e}")))
    }
}
