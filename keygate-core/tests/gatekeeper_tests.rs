mod common;

use common::{bound_config, gatekeeper, sign, validate_at};
use keygate_core::{
    GateError, Gatekeeper, GrantKind, Rejection, ValidationRequest, ValidationResult,
};

const T0: i64 = 1_700_000_000;

async fn issued_key(gatekeeper: &Gatekeeper, hwid: Option<&str>) -> String {
    gatekeeper.issue_key(hwid, T0).await.unwrap().key
}

// ── Authentication layer ─────────────────────────────────────────

#[tokio::test]
async fn wrong_signature_is_rejected_before_anything_else() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;
    let timestamp = T0.to_string();

    let result = gate
        .validate(
            ValidationRequest {
                key: &key,
                player_id: "p1",
                hwid: None,
                timestamp: &timestamp,
                signature: "12345",
            },
            T0,
        )
        .await;

    assert_eq!(result, ValidationResult::Rejected(Rejection::InvalidSignature));
    assert!(Rejection::InvalidSignature.is_auth_failure());
    // The registry was never consulted: the key is still unused.
    assert_eq!(gate.snapshot().await.active_sessions, 0);
}

#[tokio::test]
async fn stale_timestamp_is_rejected_even_for_valid_keys() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;

    // 31 seconds of skew against a 30 second window.
    let timestamp = (T0 - 31).to_string();
    let signature = sign(&key, &timestamp);
    let result = gate
        .validate(
            ValidationRequest {
                key: &key,
                player_id: "p1",
                hwid: None,
                timestamp: &timestamp,
                signature: &signature,
            },
            T0,
        )
        .await;

    assert_eq!(result, ValidationResult::Rejected(Rejection::RequestExpired));
    assert!(Rejection::RequestExpired.is_auth_failure());
}

#[tokio::test]
async fn skew_at_the_window_edge_is_accepted() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;

    let timestamp = (T0 - 30).to_string();
    let signature = sign(&key, &timestamp);
    let result = gate
        .validate(
            ValidationRequest {
                key: &key,
                player_id: "p1",
                hwid: None,
                timestamp: &timestamp,
                signature: &signature,
            },
            T0,
        )
        .await;

    assert!(matches!(result, ValidationResult::Valid { .. }));
}

#[tokio::test]
async fn unparseable_timestamp_is_stale() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;

    for timestamp in ["", "garbage", "NaN", "inf"] {
        let signature = sign(&key, timestamp);
        let result = gate
            .validate(
                ValidationRequest {
                    key: &key,
                    player_id: "p1",
                    hwid: None,
                    timestamp,
                    signature: &signature,
                },
                T0,
            )
            .await;
        assert_eq!(
            result,
            ValidationResult::Rejected(Rejection::RequestExpired),
            "timestamp {timestamp:?} slipped through"
        );
    }
}

#[tokio::test]
async fn fractional_timestamps_are_accepted() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;

    let timestamp = format!("{}.25", T0);
    let signature = sign(&key, &timestamp);
    let result = gate
        .validate(
            ValidationRequest {
                key: &key,
                player_id: "p1",
                hwid: None,
                timestamp: &timestamp,
                signature: &signature,
            },
            T0,
        )
        .await;

    assert!(matches!(result, ValidationResult::Valid { .. }));
}

// ── Lifecycle scenarios ──────────────────────────────────────────

#[tokio::test]
async fn unissued_keys_are_unknown() {
    let gate = gatekeeper();
    let result = validate_at(&gate, "KG-NEVERISSUED1", "p1", None, T0).await;
    assert_eq!(result, ValidationResult::Rejected(Rejection::UnknownKey));
}

#[tokio::test]
async fn activation_then_cache_then_expiry() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;

    // First use activates for the full window.
    assert_eq!(
        validate_at(&gate, &key, "p1", None, T0).await,
        ValidationResult::Valid {
            expires_in: 32,
            kind: GrantKind::Activated
        }
    );

    // Ten seconds later the session index answers, window shrinking.
    assert_eq!(
        validate_at(&gate, &key, "p1", None, T0 + 10).await,
        ValidationResult::Valid {
            expires_in: 22,
            kind: GrantKind::Cached
        }
    );

    // Past the window the key is dead, and stays dead.
    assert_eq!(
        validate_at(&gate, &key, "p1", None, T0 + 40).await,
        ValidationResult::Rejected(Rejection::Expired)
    );
    assert_eq!(
        validate_at(&gate, &key, "p1", None, T0 + 41).await,
        ValidationResult::Rejected(Rejection::Expired)
    );
    assert_eq!(gate.snapshot().await.active_sessions, 0);
}

#[tokio::test]
async fn registry_renewal_after_cache_loss() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;
    validate_at(&gate, &key, "p1", None, T0).await;

    // The cache is only a cache: losing the entry must not invalidate the
    // key while the registry window is still open.
    gate.session_index().write().await.remove(&key);

    let result = validate_at(&gate, &key, "p1", None, T0 + 10).await;
    assert_eq!(
        result,
        ValidationResult::Valid {
            expires_in: 22,
            kind: GrantKind::Renewed
        }
    );
    // And the entry is re-cached for the next round.
    assert_eq!(gate.snapshot().await.active_sessions, 1);
}

#[tokio::test]
async fn remaining_time_never_increases() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;

    let mut last = match validate_at(&gate, &key, "p1", None, T0).await {
        ValidationResult::Valid { expires_in, .. } => expires_in,
        other => panic!("unexpected result: {other:?}"),
    };
    for offset in [5, 11, 20, 31] {
        match validate_at(&gate, &key, "p1", None, T0 + offset).await {
            ValidationResult::Valid { expires_in, .. } => {
                assert!(expires_in < last, "window grew at +{offset}s");
                last = expires_in;
            }
            other => panic!("unexpected result at +{offset}s: {other:?}"),
        }
    }
}

// ── Ownership and device binding ─────────────────────────────────

#[tokio::test]
async fn cached_session_never_covers_another_player() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;
    validate_at(&gate, &key, "p1", None, T0).await;

    // p2 must fall through the cache and be refused by the ledger.
    assert_eq!(
        validate_at(&gate, &key, "p2", None, T0 + 5).await,
        ValidationResult::Rejected(Rejection::OwnedByOther)
    );
    // p1 is untouched by the attempt.
    assert_eq!(
        validate_at(&gate, &key, "p1", None, T0 + 6).await,
        ValidationResult::Valid {
            expires_in: 26,
            kind: GrantKind::Cached
        }
    );
}

#[tokio::test]
async fn birth_bound_key_refuses_other_devices() {
    let gate = gatekeeper();
    let key = issued_key(&gate, Some("AAAA1111")).await;

    assert_eq!(
        validate_at(&gate, &key, "p1", Some("BBBB2222"), T0).await,
        ValidationResult::Rejected(Rejection::HwidMismatch)
    );
    // The right device still gets the full window afterwards.
    assert_eq!(
        validate_at(&gate, &key, "p1", Some("AAAA1111"), T0).await,
        ValidationResult::Valid {
            expires_in: 32,
            kind: GrantKind::Activated
        }
    );
}

#[tokio::test]
async fn cached_session_never_covers_another_device() {
    let gate = gatekeeper();
    let key = issued_key(&gate, Some("AAAA1111")).await;
    validate_at(&gate, &key, "p1", Some("AAAA1111"), T0).await;

    assert_eq!(
        validate_at(&gate, &key, "p1", Some("BBBB2222"), T0 + 5).await,
        ValidationResult::Rejected(Rejection::HwidMismatch)
    );
}

// ── Issue passthrough and counters ───────────────────────────────

#[tokio::test]
async fn issue_key_enforces_the_hwid_profile() {
    let gate = Gatekeeper::new(bound_config(), common::TEST_SECRET);
    let err = gate.issue_key(None, T0).await.unwrap_err();
    assert!(matches!(err, GateError::InvalidInput(_)));
}

#[tokio::test]
async fn snapshot_tracks_issued_and_active_counts() {
    let gate = gatekeeper();
    let key = issued_key(&gate, None).await;
    issued_key(&gate, None).await;

    let before = gate.snapshot().await;
    assert_eq!(before.issued_keys, 2);
    assert_eq!(before.active_sessions, 0);

    validate_at(&gate, &key, "p1", None, T0).await;
    let after = gate.snapshot().await;
    assert_eq!(after.issued_keys, 2);
    assert_eq!(after.active_sessions, 1);
}
