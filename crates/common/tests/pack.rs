//! Integration tests for packing and unpacking envelopes

mod support;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::crypto::{generate_signing_keypair, KeyPair, SigningSecret};
use common::encoding::{b64_decode, b64_encode};
use common::keystore::{KeyStore, MemoryKeyStore};
use common::pack::{pack, unpack, PackAlg, PackError, ProtectedHeader, RecipientHeader};

#[tokio::test]
async fn test_zero_seed_anoncrypt_ping() {
    let v1 = generate_signing_keypair(Some(&[0u8; 32])).unwrap();
    let packed = pack("ping", &[v1.public], None).unwrap();

    let envelope = support::parse(&packed);
    let header = ProtectedHeader::decode(&envelope.protected).unwrap();
    assert_eq!(header.alg().unwrap(), PackAlg::Anoncrypt);
    assert_eq!(header.enc, "xchacha20poly1305_ietf");
    assert_eq!(header.typ, "JWM/1.0");
    assert_eq!(header.recipients.len(), 1);

    let protected_json: serde_json::Value =
        serde_json::from_slice(&b64_decode(&envelope.protected).unwrap()).unwrap();
    let recipient_header = &protected_json["recipients"][0]["header"];
    assert_eq!(recipient_header["kid"], v1.public.to_base58());
    assert!(recipient_header["sender"].is_null());
    assert!(recipient_header["iv"].is_null());

    let unpacked = unpack(&packed, &support::store_with(&[&v1])).await.unwrap();
    assert_eq!(unpacked.message, "ping");
    assert_eq!(unpacked.sender_verkey, None);
    assert_eq!(unpacked.recipient_verkey, v1.public.to_base58());
}

#[tokio::test]
async fn test_round_trip_across_recipient_counts() {
    let sender = KeyPair::generate();
    let messages = [
        "",
        "ping",
        r#"{"@type":"did:sov:BzCbsNYhMrjHiqZDTUASHg;spec/trust_ping/1.0/ping","@id":"42"}"#,
        "grüße aus 東京 🦀",
    ];
    for n in 1..=4 {
        let recipients = support::keypairs(n);
        let verkeys: Vec<_> = recipients.iter().map(|k| k.public).collect();
        for message in messages {
            for from in [None, Some(&sender.secret)] {
                let packed = pack(message, &verkeys, from).unwrap();
                // each recipient can open it with only their own key
                for recipient in &recipients {
                    let unpacked = unpack(&packed, &support::store_with(&[recipient]))
                        .await
                        .unwrap();
                    assert_eq!(unpacked.message, message);
                    assert_eq!(unpacked.recipient_verkey, recipient.public.to_base58());
                    assert_eq!(
                        unpacked.sender_verkey,
                        from.map(|_| sender.public.to_base58())
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn test_sender_verkey_matches_sender_secret() {
    let sender = KeyPair::from_seed(&[9u8; 32]).unwrap();
    let bob = KeyPair::generate();
    let packed = pack("hi", &[bob.public], Some(&sender.secret)).unwrap();

    let header = ProtectedHeader::decode(&support::parse(&packed).protected).unwrap();
    assert_eq!(header.alg().unwrap(), PackAlg::Authcrypt);
    assert!(header
        .recipients
        .iter()
        .all(|block| block.header.is_authenticated()));

    let unpacked = unpack(&packed, &support::store_with(&[&bob])).await.unwrap();
    assert_eq!(unpacked.sender_verkey, Some(sender.secret.public().to_base58()));
}

#[tokio::test]
async fn test_multi_recipient_independence() {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let packed = pack("shared", &[alice.public, bob.public], None).unwrap();

    let by_alice = unpack(&packed, &support::store_with(&[&alice])).await.unwrap();
    let by_bob = unpack(&packed, &support::store_with(&[&bob])).await.unwrap();
    assert_eq!(by_alice.message, by_bob.message);
    assert_eq!(by_alice.recipient_verkey, alice.public.to_base58());
    assert_eq!(by_bob.recipient_verkey, bob.public.to_base58());

    // bob's block relabelled for alice does not open with alice's key
    let mut envelope = support::parse(&packed);
    let mut header = ProtectedHeader::decode(&envelope.protected).unwrap();
    header.recipients.swap(0, 1);
    let alice_kid = header.recipients[1].header.kid().to_string();
    header.recipients[0].header = RecipientHeader::Anonymous { kid: alice_kid };
    header.recipients.truncate(1);
    envelope.protected = header.encode().unwrap();
    assert!(matches!(
        unpack(&envelope.to_bytes().unwrap(), &support::store_with(&[&alice])).await,
        Err(PackError::DecryptionFailed)
    ));
}

#[tokio::test]
async fn test_corrupt_block_breaks_header_binding_for_everyone() {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let packed = pack("shared", &[alice.public, bob.public], None).unwrap();

    let mut envelope = support::parse(&packed);
    let mut header = ProtectedHeader::decode(&envelope.protected).unwrap();
    header.recipients[0].encrypted_key =
        support::flip_bit(&header.recipients[0].encrypted_key, 40, 3);
    envelope.protected = header.encode().unwrap();
    let tampered = envelope.to_bytes().unwrap();

    // alice cannot unwrap her key; bob unwraps his but the payload no
    //  longer authenticates against the altered header
    assert!(matches!(
        unpack(&tampered, &support::store_with(&[&alice])).await,
        Err(PackError::DecryptionFailed)
    ));
    assert!(matches!(
        unpack(&tampered, &support::store_with(&[&bob])).await,
        Err(PackError::DecryptionFailed)
    ));
}

#[tokio::test]
async fn test_first_listed_local_key_wins() {
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let packed = pack("both", &[alice.public, bob.public], None).unwrap();

    let unpacked = unpack(&packed, &support::store_with(&[&bob, &alice]))
        .await
        .unwrap();
    assert_eq!(unpacked.recipient_verkey, alice.public.to_base58());
}

#[tokio::test]
async fn test_key_not_found_lists_every_kid() {
    let recipients = support::keypairs(3);
    let verkeys: Vec<_> = recipients.iter().map(|k| k.public).collect();
    let packed = pack("nobody home", &verkeys, None).unwrap();

    let stranger = KeyPair::generate();
    match unpack(&packed, &support::store_with(&[&stranger])).await {
        Err(PackError::KeyNotFound(kids)) => {
            let expected: Vec<_> = verkeys.iter().map(|v| v.to_base58()).collect();
            assert_eq!(kids, expected);
        }
        other => panic!("expected KeyNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_no_recipients_is_unopenable() {
    let packed = pack("void", &[], None).unwrap();
    let header = ProtectedHeader::decode(&support::parse(&packed).protected).unwrap();
    assert!(header.recipients.is_empty());

    let keys = support::store_with(&[&KeyPair::generate()]);
    assert!(matches!(
        unpack(&packed, &keys).await,
        Err(PackError::KeyNotFound(kids)) if kids.is_empty()
    ));
}

#[tokio::test]
async fn test_tampered_ciphertext_and_tag() {
    let bob = KeyPair::generate();
    let keys = support::store_with(&[&bob]);
    let packed = pack("do not touch", &[bob.public], None).unwrap();
    let envelope = support::parse(&packed);

    for (byte, bit) in [(0, 0), (5, 7), (11, 3)] {
        let mut tampered = envelope.clone();
        tampered.ciphertext = support::flip_bit(&envelope.ciphertext, byte, bit);
        assert!(matches!(
            unpack(&tampered.to_bytes().unwrap(), &keys).await,
            Err(PackError::DecryptionFailed)
        ));
    }

    for (byte, bit) in [(0, 0), (15, 7)] {
        let mut tampered = envelope.clone();
        tampered.tag = support::flip_bit(&envelope.tag, byte, bit);
        assert!(matches!(
            unpack(&tampered.to_bytes().unwrap(), &keys).await,
            Err(PackError::DecryptionFailed)
        ));
    }

    let mut tampered = envelope.clone();
    tampered.iv = support::flip_bit(&envelope.iv, 0, 1);
    assert!(matches!(
        unpack(&tampered.to_bytes().unwrap(), &keys).await,
        Err(PackError::DecryptionFailed)
    ));
}

#[tokio::test]
async fn test_protected_is_bound_as_raw_bytes() {
    let bob = KeyPair::generate();
    let keys = support::store_with(&[&bob]);
    let packed = pack("bound", &[bob.public], None).unwrap();
    let envelope = support::parse(&packed);

    // same header, different serialization
    let json: serde_json::Value =
        serde_json::from_slice(&b64_decode(&envelope.protected).unwrap()).unwrap();
    let mut reformatted = envelope.clone();
    reformatted.protected = b64_encode(serde_json::to_vec_pretty(&json).unwrap());
    assert!(matches!(
        unpack(&reformatted.to_bytes().unwrap(), &keys).await,
        Err(PackError::DecryptionFailed)
    ));

    // any single bit flip in the decoded header fails one way or another
    let decoded_len = b64_decode(&envelope.protected).unwrap().len();
    for byte in (0..decoded_len).step_by(decoded_len / 16 + 1) {
        let mut tampered = envelope.clone();
        tampered.protected = support::flip_bit(&envelope.protected, byte, 0);
        assert!(unpack(&tampered.to_bytes().unwrap(), &keys).await.is_err());
    }
}

#[tokio::test]
async fn test_fresh_keys_and_nonces_per_pack() {
    let sender = KeyPair::generate();
    let bob = KeyPair::generate();
    let a = support::parse(&pack("same", &[bob.public], Some(&sender.secret)).unwrap());
    let b = support::parse(&pack("same", &[bob.public], Some(&sender.secret)).unwrap());

    assert_ne!(a.iv, b.iv);
    assert_ne!(a.ciphertext, b.ciphertext);
    let header_a = ProtectedHeader::decode(&a.protected).unwrap();
    let header_b = ProtectedHeader::decode(&b.protected).unwrap();
    assert_ne!(
        header_a.recipients[0].encrypted_key,
        header_b.recipients[0].encrypted_key
    );
    assert_ne!(header_a.recipients[0].header, header_b.recipients[0].header);
}

#[tokio::test]
async fn test_unpadded_and_padded_fields_both_accepted() {
    let bob = KeyPair::generate();
    let packed = pack("padding", &[bob.public], None).unwrap();
    let mut envelope = support::parse(&packed);
    // a 12 byte iv needs no padding; a 16 byte tag needs two characters
    envelope.tag.push_str("==");
    let unpacked = unpack(&envelope.to_bytes().unwrap(), &support::store_with(&[&bob]))
        .await
        .unwrap();
    assert_eq!(unpacked.message, "padding");
}

/// Simulates a key store backed by slow storage
struct SlowStore {
    inner: MemoryKeyStore,
    delay: Duration,
}

#[async_trait]
impl KeyStore for SlowStore {
    type Error = <MemoryKeyStore as KeyStore>::Error;

    async fn find_key(&self, verkey: &str) -> Result<Option<SigningSecret>, Self::Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_key(verkey).await
    }
}

#[tokio::test]
async fn test_concurrent_pack_unpack() {
    let sender = Arc::new(KeyPair::generate());
    let recipients = support::keypairs(3);
    let keys = Arc::new(SlowStore {
        inner: support::store_with(&recipients.iter().collect::<Vec<_>>()),
        delay: Duration::from_millis(5),
    });
    let verkeys: Arc<Vec<_>> = Arc::new(recipients.iter().map(|k| k.public).collect());

    let mut handles = Vec::new();
    for i in 0..32 {
        let sender = sender.clone();
        let keys = keys.clone();
        let verkeys = verkeys.clone();
        handles.push(tokio::spawn(async move {
            let message = format!("message {}", i);
            let from = (i % 2 == 0).then_some(&sender.secret);
            let packed = pack(&message, &verkeys, from).unwrap();
            let unpacked = unpack(&packed, keys.as_ref()).await.unwrap();
            assert_eq!(unpacked.message, message);
            assert_eq!(unpacked.sender_verkey.is_some(), i % 2 == 0);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_peer_header_without_enc_and_typ_opens() {
    use common::crypto::ContentKey;
    use common::pack::{wrap_for_recipients, Envelope};
    use rand::rngs::OsRng;

    let sender = KeyPair::generate();
    let bob = KeyPair::generate();
    let cek = ContentKey::generate();
    let header = wrap_for_recipients(&mut OsRng, &cek, &[bob.public], Some(&sender.secret)).unwrap();

    // a peer that only writes alg and recipients
    let json = serde_json::json!({
        "alg": header.alg,
        "recipients": header.recipients,
    });
    let protected = b64_encode(serde_json::to_vec(&json).unwrap());
    let sealed = cek.encrypt(b"minimal header", protected.as_bytes()).unwrap();
    let envelope = Envelope {
        protected,
        iv: b64_encode(sealed.nonce),
        ciphertext: b64_encode(&sealed.ciphertext),
        tag: b64_encode(sealed.tag),
    };

    let unpacked = unpack(&envelope.to_bytes().unwrap(), &support::store_with(&[&bob]))
        .await
        .unwrap();
    assert_eq!(unpacked.message, "minimal header");
    assert_eq!(unpacked.sender_verkey, Some(sender.public.to_base58()));
}
