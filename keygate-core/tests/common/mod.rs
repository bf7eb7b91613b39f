//! Shared test helpers for gate tests.

#![allow(dead_code)]

use keygate_core::{
    ChecksumCodec, GateConfig, Gatekeeper, SignatureCodec, ValidationRequest, ValidationResult,
};

pub const TEST_SECRET: &str = "test_secret";

/// Short-lived profile used by most tests: 32 second windows.
pub fn test_config() -> GateConfig {
    GateConfig {
        key_ttl_secs: 32,
        ..GateConfig::default()
    }
}

/// Profile that demands a HWID at issue time.
pub fn bound_config() -> GateConfig {
    GateConfig {
        require_hwid: true,
        ..test_config()
    }
}

pub fn gatekeeper() -> Gatekeeper {
    Gatekeeper::new(test_config(), TEST_SECRET)
}

/// Signs `(key, timestamp)` the way a well-behaved client would.
pub fn sign(key: &str, timestamp: &str) -> String {
    ChecksumCodec::new(TEST_SECRET).sign(key, timestamp)
}

/// Runs a correctly signed, fresh validation at `now`.
pub async fn validate_at(
    gatekeeper: &Gatekeeper,
    key: &str,
    player_id: &str,
    hwid: Option<&str>,
    now: i64,
) -> ValidationResult {
    let timestamp = now.to_string();
    let signature = sign(key, &timestamp);
    gatekeeper
        .validate(
            ValidationRequest {
                key,
                player_id,
                hwid,
                timestamp: &timestamp,
                signature: &signature,
            },
            now,
        )
        .await
}
