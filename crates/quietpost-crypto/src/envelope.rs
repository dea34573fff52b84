//! Wire envelope for encrypted message bodies
//!
//! ```text
//! legacy:  base64( iv[12] ‖ ciphertext ‖ tag[16] )
//! v2:      "v2:" base64( iv[12] ‖ ciphertext ‖ tag[16] )
//! ```
//!
//! Base64 is written with the standard alphabet and padding. Reading is
//! forgiving the way browsers' `atob` is: ASCII whitespace is skipped,
//! padding is optional and non-zero trailing bits are accepted. The version
//! tag is split off once, here, into [`TaggedEnvelope`]; nothing downstream
//! looks at string prefixes.

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::STANDARD},
};

use crate::error::CryptoError;

/// Version tag marking an agreement-scheme envelope
pub const V2_PREFIX: &str = "v2:";

/// AES-GCM initialization vector size (96 bits)
pub const IV_SIZE: usize = 12;

/// AES-GCM authentication tag size
pub const TAG_SIZE: usize = 16;

const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode base64 the way `atob` does.
fn decode_forgiving(body: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: Vec<u8> = body.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    FORGIVING.decode(compact)
}

/// Key scheme an envelope (or key) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Conversation-id derived key, no version tag
    Legacy,
    /// ECDH-derived key, `"v2:"` version tag
    Agreement,
}

impl Scheme {
    /// Scheme announced by an envelope's version tag.
    ///
    /// Looks only at the tag; the body may still be malformed.
    pub fn of(text: &str) -> Self {
        TaggedEnvelope::split(text).scheme()
    }

    /// Version tag written in front of the body.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Legacy => "",
            Self::Agreement => V2_PREFIX,
        }
    }
}

/// IV and authenticated ciphertext of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// Random 96-bit IV
    pub iv: [u8; IV_SIZE],
    /// Ciphertext including the 16-byte GCM tag
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_SIZE)
    }

    fn to_base64(&self) -> String {
        let mut combined = Vec::with_capacity(IV_SIZE + self.ciphertext.len());
        combined.extend_from_slice(&self.iv);
        combined.extend_from_slice(&self.ciphertext);
        STANDARD.encode(combined)
    }

    fn from_base64(body: &str) -> Result<Self, CryptoError> {
        let combined = decode_forgiving(body)
            .map_err(|e| CryptoError::decryption(format!("invalid base64: {e}")))?;

        if combined.len() < IV_SIZE + TAG_SIZE {
            return Err(CryptoError::decryption(format!(
                "truncated envelope: {} bytes, need at least {}",
                combined.len(),
                IV_SIZE + TAG_SIZE
            )));
        }

        let (iv_bytes, ciphertext) = combined.split_at(IV_SIZE);
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(iv_bytes);

        Ok(Self { iv, ciphertext: ciphertext.to_vec() })
    }
}

/// Envelope text split at its version tag, body not yet decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedEnvelope<'a> {
    scheme: Scheme,
    body: &'a str,
}

impl<'a> TaggedEnvelope<'a> {
    /// Split off the version tag. Never fails; an untagged text is legacy.
    pub fn split(text: &'a str) -> Self {
        match text.strip_prefix(V2_PREFIX) {
            Some(body) => Self { scheme: Scheme::Agreement, body },
            None => Self { scheme: Scheme::Legacy, body: text },
        }
    }

    /// Scheme announced by the tag.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Base64 body following the tag.
    pub fn body(&self) -> &'a str {
        self.body
    }

    /// Decode the body into an [`Envelope`] of the announced scheme.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` if the body is not base64 or is too short to hold
    ///   an IV and a tag
    pub fn decode(self) -> Result<Envelope, CryptoError> {
        SealedPayload::from_base64(self.body).map(|payload| Envelope::new(self.scheme, payload))
    }
}

/// A parsed encrypted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Encrypted under the legacy conversation-id key
    Legacy(SealedPayload),
    /// Encrypted under an ECDH agreement key
    Agreement(SealedPayload),
}

impl Envelope {
    /// Wrap a payload for the given scheme.
    pub fn new(scheme: Scheme, payload: SealedPayload) -> Self {
        match scheme {
            Scheme::Legacy => Self::Legacy(payload),
            Scheme::Agreement => Self::Agreement(payload),
        }
    }

    /// Parse envelope text.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` if the body is not base64 or is too short to hold
    ///   an IV and a tag
    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        TaggedEnvelope::split(text).decode()
    }

    /// Render as envelope text.
    pub fn encode(&self) -> String {
        let mut text = String::from(self.scheme().prefix());
        text.push_str(&self.payload().to_base64());
        text
    }

    /// Scheme of this envelope.
    pub fn scheme(&self) -> Scheme {
        match self {
            Self::Legacy(_) => Scheme::Legacy,
            Self::Agreement(_) => Scheme::Agreement,
        }
    }

    /// IV and ciphertext.
    pub fn payload(&self) -> &SealedPayload {
        match self {
            Self::Legacy(payload) | Self::Agreement(payload) => payload,
        }
    }
}

/// Heuristic: does `text` look like an envelope rather than plaintext?
///
/// Strips an optional `"v2:"` tag and reports true when the rest is base64
/// decoding to more than an IV's worth of bytes. Advisory only; short
/// plaintext such as `"abcdefghijklmnopqrst"` also passes.
pub fn is_likely_encrypted(text: &str) -> bool {
    let body = TaggedEnvelope::split(text).body();
    decode_forgiving(body).is_ok_and(|decoded| decoded.len() > IV_SIZE)
}
