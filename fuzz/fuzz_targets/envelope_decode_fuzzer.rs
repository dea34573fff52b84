//! Fuzz target for envelope and JWK decoding
//!
//! Feeds arbitrary text to every parser that sees data from the network or
//! from local storage.
//!
//! # Invariants
//!
//! - Parsers never panic
//! - A parsed envelope re-encodes to text that parses to the same envelope
//! - Splitting at the tag then decoding agrees with parsing in one step
//! - A v2 envelope without key material is always `MissingKeys`
//! - Legacy decryption of arbitrary text never yields `MissingKeys`

#![no_main]

use libfuzzer_sys::fuzz_target;
use quietpost_core::{ConversationId, DecryptOutcome, MessageCipher, SystemEnv};
use quietpost_crypto::{
    Envelope, Scheme, TaggedEnvelope, decode_private_key, decode_public_key, is_likely_encrypted,
};

fuzz_target!(|text: &str| {
    let _ = decode_public_key(text);
    let _ = decode_private_key(text);
    let _ = is_likely_encrypted(text);
    assert_eq!(TaggedEnvelope::split(text).decode(), Envelope::parse(text));

    if let Ok(envelope) = Envelope::parse(text) {
        let reparsed = Envelope::parse(&envelope.encode());
        assert_eq!(reparsed.as_ref(), Ok(&envelope), "re-encoded envelope must parse identically");
        assert_eq!(envelope.scheme(), Scheme::of(text));
    }

    let cipher = MessageCipher::new(SystemEnv::new());
    let conversation = ConversationId::new("fuzz_peer");
    let outcome = cipher.decrypt(text, &conversation, None, None);

    match Scheme::of(text) {
        Scheme::Agreement => assert_eq!(outcome, DecryptOutcome::MissingKeys),
        Scheme::Legacy => assert_ne!(outcome, DecryptOutcome::MissingKeys),
    }
});
