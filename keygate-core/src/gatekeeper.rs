//! The validation orchestrator.
//!
//! [`Gatekeeper`] owns the shared registry and session index and runs the
//! full validation pipeline: signature, timestamp freshness, session
//! fast-path, then the registry state machine, writing back to the index on
//! success. All clock input arrives as an explicit `now` parameter.

use crate::config::GateConfig;
use crate::error::GateResult;
use crate::registry::{KeyRecord, KeyRegistry, Outcome};
use crate::session::{SessionEntry, SessionIndex};
use crate::signature::{ChecksumCodec, SignatureCodec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// One validation request, as received at the boundary.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRequest<'a> {
    /// The access key under validation.
    pub key: &'a str,
    /// The requesting player.
    pub player_id: &'a str,
    /// The requesting device's fingerprint, if the client sends one.
    pub hwid: Option<&'a str>,
    /// Client-supplied timestamp, verbatim from the wire (decimal seconds).
    pub timestamp: &'a str,
    /// Client-supplied signature over `(key, timestamp)`.
    pub signature: &'a str,
}

/// How a granted validation was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantKind {
    /// First use; the key was just activated.
    Activated,
    /// Repeat use by the owner, answered by the registry.
    Renewed,
    /// Repeat use answered from the session index without touching the
    /// registry.
    Cached,
}

impl GrantKind {
    /// Human-facing message for this grant.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Activated => "access granted",
            Self::Renewed => "welcome back",
            Self::Cached => "key still valid",
        }
    }
}

/// Why a validation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Signature does not match the payload and timestamp.
    InvalidSignature,
    /// Request timestamp is outside the freshness window.
    RequestExpired,
    /// Key was never issued.
    UnknownKey,
    /// Key is bound to a different device.
    HwidMismatch,
    /// Key is active and owned by a different player.
    OwnedByOther,
    /// The key's activation window has closed. Terminal.
    Expired,
}

impl Rejection {
    /// True for authentication-layer failures, which the boundary reports
    /// as HTTP 401 instead of a semantic `valid: false`.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::InvalidSignature | Self::RequestExpired)
    }

    /// Human-facing reason string.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid signature",
            Self::RequestExpired => "request expired",
            Self::UnknownKey => "unknown key",
            Self::HwidMismatch => "hwid mismatch",
            Self::OwnedByOther => "key bound to another player",
            Self::Expired => "key expired",
        }
    }
}

/// Outcome of a full validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    /// Access granted; the key is valid for `expires_in` more seconds.
    Valid {
        /// Seconds of validity remaining.
        expires_in: i64,
        /// How the grant was satisfied.
        kind: GrantKind,
    },
    /// Access refused.
    Rejected(Rejection),
}

/// Read-only counters for status reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GateSnapshot {
    /// Currently-resident session entries.
    pub active_sessions: usize,
    /// Keys ever issued.
    pub issued_keys: usize,
}

/// The validation orchestrator and owner of all shared gate state.
pub struct Gatekeeper {
    config: GateConfig,
    codec: Arc<dyn SignatureCodec>,
    registry: Arc<RwLock<KeyRegistry>>,
    index: Arc<RwLock<SessionIndex>>,
}

impl Gatekeeper {
    /// Creates a gatekeeper using the compatibility checksum codec.
    pub fn new(config: GateConfig, secret: impl Into<String>) -> Self {
        let codec = Arc::new(ChecksumCodec::new(secret));
        Self::with_codec(config, codec)
    }

    /// Creates a gatekeeper with a custom signature codec.
    pub fn with_codec(config: GateConfig, codec: Arc<dyn SignatureCodec>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(KeyRegistry::new(config.clone()))),
            index: Arc::new(RwLock::new(SessionIndex::new())),
            config,
            codec,
        }
    }

    /// The deployment profile this gatekeeper runs under.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Shared handle to the session index, for the expiry sweeper.
    pub fn session_index(&self) -> Arc<RwLock<SessionIndex>> {
        Arc::clone(&self.index)
    }

    /// Issues a new key, optionally bound to a device fingerprint.
    pub async fn issue_key(&self, hwid: Option<&str>, now: i64) -> GateResult<KeyRecord> {
        self.registry.write().await.issue(hwid, now)
    }

    /// Runs the full validation pipeline for one request.
    pub async fn validate(&self, req: ValidationRequest<'_>, now: i64) -> ValidationResult {
        if !self.codec.verify(req.key, req.timestamp, req.signature) {
            return ValidationResult::Rejected(Rejection::InvalidSignature);
        }
        if !self.is_fresh(req.timestamp, now) {
            return ValidationResult::Rejected(Rejection::RequestExpired);
        }

        // Fast path: a cached session answers without touching the registry,
        // but only for the same owner on the same device. Anything else
        // falls through so the ledger decides.
        {
            let mut index = self.index.write().await;
            if let Some(entry) = index.lookup(req.key, now) {
                let same_owner = entry.player_id == req.player_id;
                let same_device = match &entry.hwid {
                    Some(bound) => req.hwid == Some(bound.as_str()),
                    None => true,
                };
                if same_owner && same_device {
                    return ValidationResult::Valid {
                        expires_in: entry.remaining_secs(now),
                        kind: GrantKind::Cached,
                    };
                }
            }
        }

        let (outcome, entry) = {
            let mut registry = self.registry.write().await;
            let outcome = registry.activate_or_renew(req.key, req.player_id, req.hwid, now);
            let entry = match &outcome {
                Outcome::Activated { expires_at } | Outcome::Renewed { expires_at } => registry
                    .get(req.key)
                    .map(|record| SessionEntry {
                        key: record.key.clone(),
                        player_id: req.player_id.to_string(),
                        hwid: record.hwid.clone(),
                        created_at: now,
                        expires_at: *expires_at,
                    }),
                _ => None,
            };
            (outcome, entry)
        };

        if let Some(entry) = entry {
            self.index.write().await.put(entry);
        }

        match outcome {
            Outcome::Activated { expires_at } => ValidationResult::Valid {
                expires_in: expires_at - now,
                kind: GrantKind::Activated,
            },
            Outcome::Renewed { expires_at } => ValidationResult::Valid {
                expires_in: expires_at - now,
                kind: GrantKind::Renewed,
            },
            Outcome::NotFound => ValidationResult::Rejected(Rejection::UnknownKey),
            Outcome::HwidMismatch => ValidationResult::Rejected(Rejection::HwidMismatch),
            Outcome::OwnedByOther => ValidationResult::Rejected(Rejection::OwnedByOther),
            Outcome::Expired => {
                debug!(key = req.key, "validation of expired key");
                ValidationResult::Rejected(Rejection::Expired)
            }
        }
    }

    /// Current counters for status reporting.
    pub async fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            active_sessions: self.index.read().await.len(),
            issued_keys: self.registry.read().await.count(),
        }
    }

    /// Checks the request timestamp against the freshness window.
    ///
    /// The wire carries decimal (possibly fractional) seconds; anything
    /// unparseable or non-finite is stale by definition.
    fn is_fresh(&self, timestamp: &str, now: i64) -> bool {
        let Ok(ts) = timestamp.trim().parse::<f64>() else {
            return false;
        };
        if !ts.is_finite() {
            return false;
        }
        (now as f64 - ts).abs() <= self.config.freshness_window_secs as f64
    }
}
