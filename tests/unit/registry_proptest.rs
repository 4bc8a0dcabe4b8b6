use keymirror::blacklist::BlacklistSet;
use keymirror::keyinfo::CollectedKey;
use keymirror::registry::{SessionId, SessionRegistry};
use proptest::prelude::*;
use russh::keys::ssh_key::public::{Ed25519PublicKey, KeyData};
use russh::keys::PublicKey;

/// Ed25519 key whose point bytes start with `bytes`.
fn key_from(bytes: &[u8]) -> CollectedKey {
    let mut point = [0u8; 32];
    let len = bytes.len().min(32);
    point[..len].copy_from_slice(&bytes[..len]);
    CollectedKey::from_public_key(&PublicKey::new(
        KeyData::Ed25519(Ed25519PublicKey(point)),
        "",
    ))
}

proptest! {
    #[test]
    fn appended_keys_keep_offer_order(
        tails in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..16), 0..20)
    ) {
        let registry = SessionRegistry::new();
        let id = SessionId::new();
        registry.open(&id);
        for tail in &tails {
            registry.append(&id, key_from(tail));
        }

        let stored = registry.get(&id);
        prop_assert_eq!(stored.len(), tails.len());
        for (key, tail) in stored.iter().zip(&tails) {
            prop_assert_eq!(key, &key_from(tail));
        }

        let removed = registry.delete(&id).unwrap();
        prop_assert_eq!(removed.len(), tails.len());
        prop_assert!(!registry.contains(&id));
        prop_assert!(registry.get(&id).is_empty());
    }

    #[test]
    fn sessions_do_not_share_keys(a in 0usize..8, b in 0usize..8) {
        let registry = SessionRegistry::new();
        let first = SessionId::new();
        let second = SessionId::new();
        registry.open(&first);
        registry.open(&second);
        for i in 0..a {
            registry.append(&first, key_from(&[i as u8]));
        }
        for i in 0..b {
            registry.append(&second, key_from(&[0xff, i as u8]));
        }

        prop_assert_eq!(registry.get(&first).len(), a);
        prop_assert_eq!(registry.get(&second).len(), b);
        registry.delete(&first);
        prop_assert_eq!(registry.get(&second).len(), b);
        prop_assert_eq!(registry.len(), 1);
    }

    #[test]
    fn mark_blacklisted_flags_only_listed_keys(flags in proptest::collection::vec(any::<bool>(), 1..10)) {
        let registry = SessionRegistry::new();
        let id = SessionId::new();
        registry.open(&id);
        let keys: Vec<CollectedKey> = (0..flags.len()).map(|i| key_from(&[i as u8, 0x42])).collect();
        for key in &keys {
            registry.append(&id, key.clone());
        }
        let listed = keys
            .iter()
            .zip(&flags)
            .filter(|(_, flagged)| **flagged)
            .map(|(key, _)| key.canonical());
        let blacklist = BlacklistSet::from_lines(listed);

        let marked = registry.mark_blacklisted(&id, &blacklist);
        prop_assert_eq!(marked.len(), flags.len());
        for (key, flagged) in marked.iter().zip(&flags) {
            prop_assert_eq!(key.blacklisted, *flagged);
        }
    }
}
