//! The key registry: permanent ledger of every issued key.
//!
//! Each key moves through a one-way state machine: `UNUSED` until its first
//! successful validation, then `ACTIVE` with a fixed expiry window. Records
//! are never deleted; an expired key stays in the ledger so later attempts
//! are answered with "expired" rather than silently re-issued.

use crate::config::GateConfig;
use crate::error::{GateError, GateResult};
use crate::keygen::KeyGenerator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Generation attempts before giving up on a colliding key space.
const MAX_ISSUE_ATTEMPTS: usize = 8;

/// One issued key and everything ever decided about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Generator-assigned identifier. Immutable.
    pub key: String,
    /// Bound device fingerprint, if any. Immutable once set.
    pub hwid: Option<String>,
    /// Issuance time (epoch seconds).
    pub created_at: i64,
    /// False until the first successful activation.
    pub used: bool,
    /// Owner fixed at first activation. Immutable once set.
    pub player_id: Option<String>,
    /// Absolute expiry, set at first activation.
    pub expires_at: Option<i64>,
    /// Validity window granted at activation, copied from the profile at
    /// issue time so config changes never alter outstanding keys.
    pub duration_secs: i64,
}

impl KeyRecord {
    /// Returns true if the key was activated and its window has closed.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires_at) if now >= expires_at)
    }
}

/// Result of an activation/renewal attempt against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Key was never issued.
    NotFound,
    /// Bound device fingerprint differs from the request's. Record untouched.
    HwidMismatch,
    /// First use: owner and expiry are now fixed.
    Activated {
        /// The freshly computed absolute expiry.
        expires_at: i64,
    },
    /// Repeat use by the owner inside the window. Registry state unchanged.
    Renewed {
        /// The unchanged absolute expiry.
        expires_at: i64,
    },
    /// The owner's window has closed. Terminal.
    Expired,
    /// Key is active and belongs to a different player. Record untouched.
    OwnedByOther,
}

/// In-memory ledger of issued keys.
#[derive(Debug)]
pub struct KeyRegistry {
    keys: HashMap<String, KeyRecord>,
    generator: KeyGenerator,
    config: GateConfig,
}

impl KeyRegistry {
    /// Creates an empty registry for the given profile.
    pub fn new(config: GateConfig) -> Self {
        Self {
            keys: HashMap::new(),
            generator: KeyGenerator::from_config(&config),
            config,
        }
    }

    /// Issues a new `UNUSED` key, optionally bound to a device fingerprint.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the profile requires a HWID and none was given,
    /// or the given HWID is shorter than the profile minimum.
    /// `KeyCollision` when generation keeps hitting already-issued keys.
    pub fn issue(&mut self, hwid: Option<&str>, now: i64) -> GateResult<KeyRecord> {
        let hwid = match hwid.map(str::trim) {
            Some("") | None if self.config.require_hwid => {
                return Err(GateError::InvalidInput("hwid is required".to_string()));
            }
            Some("") | None => None,
            Some(h) if h.len() < self.config.min_hwid_len => {
                return Err(GateError::InvalidInput(format!(
                    "hwid must be at least {} characters",
                    self.config.min_hwid_len
                )));
            }
            Some(h) => Some(h.to_string()),
        };

        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let key = self.generator.generate();
            if self.keys.contains_key(&key) {
                continue;
            }
            let record = KeyRecord {
                key: key.clone(),
                hwid: hwid.clone(),
                created_at: now,
                used: false,
                player_id: None,
                expires_at: None,
                duration_secs: self.config.key_ttl_secs,
            };
            self.keys.insert(key, record.clone());
            debug!(key = %record.key, bound = record.hwid.is_some(), "key issued");
            return Ok(record);
        }
        Err(GateError::KeyCollision)
    }

    /// Runs the activation/renewal state machine for one request.
    ///
    /// First use fixes the owner, the device binding (if the request carries
    /// one and the key is not already bound), and the expiry. Every later
    /// use is checked against those fixed fields and mutates nothing.
    pub fn activate_or_renew(
        &mut self,
        key: &str,
        player_id: &str,
        hwid: Option<&str>,
        now: i64,
    ) -> Outcome {
        let Some(record) = self.keys.get_mut(key) else {
            return Outcome::NotFound;
        };

        if let Some(bound) = &record.hwid {
            if hwid != Some(bound.as_str()) {
                return Outcome::HwidMismatch;
            }
        }

        if !record.used {
            let expires_at = now + record.duration_secs;
            record.used = true;
            record.player_id = Some(player_id.to_string());
            record.expires_at = Some(expires_at);
            if record.hwid.is_none() {
                record.hwid = hwid.map(str::to_string);
            }
            debug!(key, player_id, expires_at, "key activated");
            return Outcome::Activated { expires_at };
        }

        if record.player_id.as_deref() != Some(player_id) {
            return Outcome::OwnedByOther;
        }

        match record.expires_at {
            Some(expires_at) if now < expires_at => Outcome::Renewed { expires_at },
            _ => Outcome::Expired,
        }
    }

    /// Returns the ledger record for a key.
    pub fn get(&self, key: &str) -> Option<&KeyRecord> {
        self.keys.get(key)
    }

    /// Total number of keys ever issued.
    #[must_use]
    pub fn count(&self) -> usize {
        self.keys.len()
    }
}
