use inkpost::credentials::{HashingCost, hash_password, verify_password};

// A deliberately light work factor so the property tests stay fast. The
// parameters are embedded in the PHC string, so verification is unaffected.
fn test_cost() -> HashingCost {
    HashingCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

#[test]
fn test_hash_then_verify_roundtrip() {
    let hash = hash_password("correct horse battery staple", &test_cost()).unwrap();
    assert!(verify_password("correct horse battery staple", &hash));
}

#[test]
fn test_wrong_password_fails_verification() {
    let hash = hash_password("correct horse battery staple", &test_cost()).unwrap();
    assert!(!verify_password("Tr0ub4dor&3", &hash));
    assert!(!verify_password("", &hash));
    // Case matters.
    assert!(!verify_password("Correct horse battery staple", &hash));
}

#[test]
fn test_hash_is_salted() {
    let first = hash_password("same password", &test_cost()).unwrap();
    let second = hash_password("same password", &test_cost()).unwrap();

    // A fresh random salt means two hashes of the same password never collide,
    // yet both verify.
    assert_ne!(first, second);
    assert!(verify_password("same password", &first));
    assert!(verify_password("same password", &second));
}

#[test]
fn test_hash_is_phc_format_and_never_contains_password() {
    let hash = hash_password("s3cret-value", &test_cost()).unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(!hash.contains("s3cret-value"));
}

#[test]
fn test_malformed_hash_fails_closed() {
    // A corrupted or non-PHC stored hash must verify as false, never error
    // into a path a caller could mistake for success.
    assert!(!verify_password("anything", ""));
    assert!(!verify_password("anything", "not-a-hash"));
    assert!(!verify_password("anything", "$argon2id$truncated"));
    assert!(!verify_password(
        "anything",
        "$pbkdf2-sha256$i=1000$c2FsdA$aGFzaA"
    ));
}

#[test]
fn test_default_cost_hashes_verify() {
    let hash = hash_password("default cost", &HashingCost::default()).unwrap();
    assert!(verify_password("default cost", &hash));
}
