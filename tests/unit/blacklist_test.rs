use keymirror::blacklist::BlacklistSet;
use keymirror::keyinfo::CollectedKey;
use tempfile::tempdir;

fn fixture_key(name: &str) -> CollectedKey {
    let line = std::fs::read_to_string(format!(
        "{}/tests/fixtures/keys/{}",
        env!("CARGO_MANIFEST_DIR"),
        name
    ))
    .unwrap();
    CollectedKey::from_authorized_line(&line).unwrap()
}

#[test]
fn load_dir_merges_all_files() {
    let dir = tempdir().unwrap();
    let rsa = fixture_key("rsa2048.pub");
    let ecdsa = fixture_key("ecdsa256.pub");
    std::fs::write(dir.path().join("a.keys"), format!("{}\n\n", rsa.canonical())).unwrap();
    std::fs::write(
        dir.path().join("b.keys"),
        format!("   {}   \n\t\n", ecdsa.canonical()),
    )
    .unwrap();

    let set = BlacklistSet::load_dir(dir.path()).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.is_blacklisted(&rsa));
    assert!(set.is_blacklisted(&ecdsa));
    assert!(!set.is_blacklisted(&fixture_key("ed25519.pub")));
}

#[test]
fn duplicate_entries_collapse() {
    let dir = tempdir().unwrap();
    let line = fixture_key("rsa3072.pub").canonical();
    std::fs::write(dir.path().join("one"), format!("{}\n", line)).unwrap();
    std::fs::write(dir.path().join("two"), format!("{}\n{}\n", line, line)).unwrap();

    let set = BlacklistSet::load_dir(dir.path()).unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn empty_dir_gives_empty_set() {
    let dir = tempdir().unwrap();
    let set = BlacklistSet::load_dir(dir.path()).unwrap();
    assert!(set.is_empty());
}

#[test]
fn subdirectory_is_rejected() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("ok"), "ssh-rsa AAAA\n").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let err = BlacklistSet::load_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("subdirectories not supported"));
}

#[test]
fn missing_dir_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(BlacklistSet::load_dir(&dir.path().join("absent")).is_err());
}

#[test]
fn entry_with_comment_does_not_match_canonical_key() {
    // Canonical form carries no comment, so the full .pub line never matches
    let raw = std::fs::read_to_string(format!(
        "{}/tests/fixtures/keys/rsa2048.pub",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    let set = BlacklistSet::from_lines([raw.as_str()]);
    assert!(!set.is_blacklisted(&fixture_key("rsa2048.pub")));
    assert!(set.contains_line(&raw));
}
