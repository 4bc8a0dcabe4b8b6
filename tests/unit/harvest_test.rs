use keymirror::auth::AuthDecision;
use keymirror::blacklist::BlacklistSet;
use keymirror::config::types::AppConfig;
use keymirror::context::AppContext;
use keymirror::keyinfo::CollectedKey;
use keymirror::registry::SessionId;

fn fixture_key(name: &str) -> CollectedKey {
    let line = std::fs::read_to_string(format!(
        "{}/tests/fixtures/keys/{}",
        env!("CARGO_MANIFEST_DIR"),
        name
    ))
    .unwrap();
    CollectedKey::from_authorized_line(&line).unwrap()
}

fn context() -> AppContext {
    AppContext::new(AppConfig::default(), BlacklistSet::empty())
}

#[test]
fn every_offer_is_rejected_and_recorded() {
    let ctx = context();
    let id = SessionId::new();
    ctx.registry.open(&id);

    for name in ["rsa2048.pub", "ecdsa384.pub", "ed25519.pub"] {
        assert_eq!(
            ctx.auth.offer_public_key(&id, fixture_key(name)),
            AuthDecision::Reject
        );
    }

    let keys = ctx.registry.get(&id);
    let algorithms: Vec<&str> = keys.iter().map(|k| k.algorithm()).collect();
    assert_eq!(
        algorithms,
        ["ssh-rsa", "ecdsa-sha2-nistp384", "ssh-ed25519"]
    );
}

#[test]
fn same_key_offered_twice_is_recorded_twice() {
    let ctx = context();
    let id = SessionId::new();
    ctx.registry.open(&id);

    let key = fixture_key("rsa2048.pub");
    ctx.auth.offer_public_key(&id, key.clone());
    ctx.auth.offer_public_key(&id, key);
    assert_eq!(ctx.registry.get(&id).len(), 2);
}

#[test]
fn keyboard_interactive_is_accepted() {
    let ctx = context();
    let id = SessionId::new();
    ctx.registry.open(&id);
    assert_eq!(ctx.auth.attempt_interactive(&id), AuthDecision::Accept);

    ctx.auth.offer_public_key(&id, fixture_key("dsa1024.pub"));
    assert_eq!(ctx.auth.attempt_interactive(&id), AuthDecision::Accept);
}

#[test]
fn offers_land_in_their_own_session() {
    let ctx = context();
    let a = SessionId::new();
    let b = SessionId::new();
    ctx.registry.open(&a);
    ctx.registry.open(&b);

    ctx.auth.offer_public_key(&a, fixture_key("rsa2048.pub"));
    ctx.auth.offer_public_key(&b, fixture_key("ecdsa256.pub"));
    ctx.auth.offer_public_key(&b, fixture_key("ecdsa521.pub"));

    assert_eq!(ctx.registry.get(&a).len(), 1);
    assert_eq!(ctx.registry.get(&b).len(), 2);
}
