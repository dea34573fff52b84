//! Fuzz target for the encrypt → transmit → decrypt pipeline
//!
//! # Strategy
//!
//! - Two identities from fuzzer-chosen scalars
//! - Messages with or without the peer key (v2 or legacy)
//! - Optional single-byte corruption of the envelope in transit
//!
//! # Invariants
//!
//! - Untouched envelopes always decrypt to the original plaintext
//! - Corrupted envelopes never decrypt to a different plaintext
//! - Both participants derive the same v2 key
//! - Nothing panics

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use quietpost_core::{ConversationId, DecryptOutcome, MessageCipher, SystemEnv};
use quietpost_crypto::KeyPair;

#[derive(Debug, Clone, Arbitrary)]
struct PipelineScenario {
    alice_scalar: [u8; 32],
    bob_scalar: [u8; 32],
    messages: Vec<MessageInput>,
}

#[derive(Debug, Clone, Arbitrary)]
struct MessageInput {
    plaintext: String,
    /// Encrypt with the peer's public key (v2) instead of legacy
    use_peer_key: bool,
    /// Corrupt one envelope byte: (position, xor mask)
    corruption: Option<(u16, u8)>,
}

fuzz_target!(|scenario: PipelineScenario| {
    let (Ok(alice), Ok(bob)) = (
        KeyPair::from_random_bytes(&scenario.alice_scalar),
        KeyPair::from_random_bytes(&scenario.bob_scalar),
    ) else {
        return;
    };

    let conversation = ConversationId::between("alice", "bob");
    let alice_cipher = MessageCipher::new(SystemEnv::new());
    let bob_cipher = MessageCipher::new(SystemEnv::new());

    for message in scenario.messages.iter().take(16) {
        let (sender_keys, receiver_keys) = if message.use_peer_key {
            (
                (Some(alice.private_key()), Some(bob.public_key())),
                (Some(bob.private_key()), Some(alice.public_key())),
            )
        } else {
            ((None, None), (None, None))
        };

        let envelope =
            alice_cipher.encrypt(&message.plaintext, &conversation, sender_keys.0, sender_keys.1);
        assert_eq!(envelope.starts_with("v2:"), message.use_peer_key);

        let received = match message.corruption {
            Some((position, mask)) if mask != 0 => {
                let mut bytes = envelope.clone().into_bytes();
                let index = usize::from(position) % bytes.len();
                bytes[index] ^= mask;
                match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => continue,
                }
            },
            _ => envelope.clone(),
        };

        let outcome =
            bob_cipher.decrypt(&received, &conversation, receiver_keys.0, receiver_keys.1);

        if received == envelope {
            assert_eq!(outcome, DecryptOutcome::Decrypted(message.plaintext.clone()));
        } else if let DecryptOutcome::Decrypted(text) = &outcome {
            // Only harmless re-encodings (e.g. base64 padding bits) may survive
            assert_eq!(text, &message.plaintext, "corrupted envelope produced forged plaintext");
        }
    }
});
