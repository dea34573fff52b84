//! Textual key interchange (JWK)
//!
//! Keys are stored and published as JSON Web Keys:
//!
//! ```text
//! {"kty":"EC","crv":"P-256","x":"<b64url>","y":"<b64url>"}          public
//! {"kty":"EC","crv":"P-256","x":"<b64url>","y":"<b64url>","d":"…"}  private
//! ```
//!
//! Members other than these five (`ext`, `key_ops`, `alg` as written by
//! browser key exports) are ignored on import. Decoding rejects anything that
//! is not a valid point or scalar on P-256.

use p256::SecretKey;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{
    error::CryptoError,
    keys::{PrivateKey, PublicKey},
};

/// JWK key type for elliptic-curve keys
const KEY_TYPE: &str = "EC";

/// JWK curve name for P-256
const CURVE: &str = "P-256";

/// The JWK members this codec understands.
#[derive(Serialize, Deserialize)]
struct JwkMembers {
    kty: String,
    crv: String,
    x: String,
    y: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    d: Option<String>,
}

impl Drop for JwkMembers {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.d.zeroize();
    }
}

/// Parse JWK text, keeping only the members we understand.
///
/// Returns the canonical JSON form of those members.
fn canonical_jwk(text: &str) -> Result<(Zeroizing<String>, bool), CryptoError> {
    let members: JwkMembers = serde_json::from_str(text)
        .map_err(|e| CryptoError::malformed(format!("not a JWK: {e}")))?;

    if members.kty != KEY_TYPE {
        return Err(CryptoError::malformed(format!("unsupported key type {:?}", members.kty)));
    }
    if members.crv != CURVE {
        return Err(CryptoError::malformed(format!("unsupported curve {:?}", members.crv)));
    }

    let has_private = members.d.is_some();
    let canonical = serde_json::to_string(&members)
        .map_err(|e| CryptoError::malformed(format!("re-encoding JWK: {e}")))?;

    Ok((Zeroizing::new(canonical), has_private))
}

/// Encode a public key as JWK text.
pub fn encode_public_key(key: &PublicKey) -> String {
    key.inner().to_jwk_string()
}

/// Decode a public key from JWK text.
///
/// A private JWK is accepted too; only its public members are used.
///
/// # Errors
///
/// - `MalformedKeyData` if the text is not an EC P-256 JWK or the point is
///   not on the curve
pub fn decode_public_key(text: &str) -> Result<PublicKey, CryptoError> {
    let (canonical, _) = canonical_jwk(text)?;

    p256::PublicKey::from_jwk_str(&canonical)
        .map(PublicKey::from_inner)
        .map_err(|_| CryptoError::malformed("invalid P-256 public point"))
}

/// Encode a private key as JWK text (includes the public coordinates).
///
/// The result is for local storage only and is zeroized on drop.
pub fn encode_private_key(key: &PrivateKey) -> Zeroizing<String> {
    key.inner().to_jwk_string()
}

/// Decode a private key from JWK text.
///
/// # Errors
///
/// - `MalformedKeyData` if the text is not an EC P-256 JWK, has no `d`
///   member, or the scalar is invalid
pub fn decode_private_key(text: &str) -> Result<PrivateKey, CryptoError> {
    let (canonical, has_private) = canonical_jwk(text)?;
    if !has_private {
        return Err(CryptoError::malformed("JWK has no private component"));
    }

    SecretKey::from_jwk_str(&canonical)
        .map(PrivateKey::from_inner)
        .map_err(|_| CryptoError::malformed("invalid P-256 private key"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;

    /// Public JWK for scalar 0x11..11, as a browser would export it.
    const BROWSER_PUBLIC_JWK: &str = r#"{"crv":"P-256","ext":true,"key_ops":[],"kty":"EC","x":"AhfmF_C2RDkoJ4-WmZ5pojpPLBUr321s32bluAKC1O0","y":"GUp968uXcS0t2jyoWqh2Wlb0X8dYWZZS8ol8ZTBuV5Q"}"#;

    /// Private JWK for scalar 0x11..11, as a browser would export it.
    const BROWSER_PRIVATE_JWK: &str = r#"{"crv":"P-256","d":"ERERERERERERERERERERERERERERERERERERERERERE","ext":true,"key_ops":["deriveKey"],"kty":"EC","x":"AhfmF_C2RDkoJ4-WmZ5pojpPLBUr321s32bluAKC1O0","y":"GUp968uXcS0t2jyoWqh2Wlb0X8dYWZZS8ol8ZTBuV5Q"}"#;

    fn test_pair() -> KeyPair {
        KeyPair::from_random_bytes(&[0x11; 32]).unwrap()
    }

    #[test]
    fn public_key_roundtrip() {
        let pair = test_pair();
        let text = encode_public_key(pair.public_key());
        let decoded = decode_public_key(&text).unwrap();
        assert_eq!(decoded, *pair.public_key());
    }

    #[test]
    fn private_key_roundtrip() {
        let pair = test_pair();
        let text = encode_private_key(pair.private_key());
        let decoded = decode_private_key(&text).unwrap();
        assert_eq!(decoded.public_key(), *pair.public_key());
    }

    #[test]
    fn encoded_public_key_names_curve() {
        let text = encode_public_key(test_pair().public_key());
        assert!(text.contains(r#""crv":"P-256""#));
        assert!(text.contains(r#""kty":"EC""#));
        assert!(!text.contains(r#""d""#));
    }

    #[test]
    fn browser_exports_are_accepted() {
        let pair = test_pair();

        let public = decode_public_key(BROWSER_PUBLIC_JWK).unwrap();
        assert_eq!(public, *pair.public_key());

        let private = decode_private_key(BROWSER_PRIVATE_JWK).unwrap();
        assert_eq!(private.public_key(), *pair.public_key());
    }

    #[test]
    fn private_jwk_decodes_as_public() {
        let public = decode_public_key(BROWSER_PRIVATE_JWK).unwrap();
        assert_eq!(public, *test_pair().public_key());
    }

    #[test]
    fn public_jwk_is_not_a_private_key() {
        let result = decode_private_key(BROWSER_PUBLIC_JWK);
        assert!(matches!(
            result,
            Err(CryptoError::MalformedKeyData { reason }) if reason.contains("private")
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        for input in ["", "not json", "{}", "[]", r#"{"kty":"EC"}"#] {
            assert!(
                matches!(decode_public_key(input), Err(CryptoError::MalformedKeyData { .. })),
                "input {input:?} should be rejected"
            );
            assert!(matches!(decode_private_key(input), Err(CryptoError::MalformedKeyData { .. })));
        }
    }

    #[test]
    fn other_curves_are_rejected() {
        let p384 = BROWSER_PUBLIC_JWK.replace("P-256", "P-384");
        let result = decode_public_key(&p384);
        assert!(matches!(
            result,
            Err(CryptoError::MalformedKeyData { reason }) if reason.contains("curve")
        ));

        let rsa = BROWSER_PUBLIC_JWK.replace(r#""kty":"EC""#, r#""kty":"RSA""#);
        assert!(decode_public_key(&rsa).is_err());
    }

    #[test]
    fn point_off_curve_is_rejected() {
        // Valid base64url coordinates that do not satisfy the curve equation
        let bogus = r#"{"kty":"EC","crv":"P-256","x":"AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE","y":"AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE"}"#;
        assert!(matches!(decode_public_key(bogus), Err(CryptoError::MalformedKeyData { .. })));
    }
}
