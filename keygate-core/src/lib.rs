//! Access-key lifecycle and validation for Keygate.
//!
//! This crate implements the gatekeeping engine behind the Keygate HTTP
//! service:
//! - Prefixed random key generation
//! - A permanent registry of issued keys with one-shot activation
//! - HWID (device fingerprint) binding at issue or first activation
//! - A time-indexed session cache with lazy and swept eviction
//! - Request signature and freshness checks
//!
//! # Design Principles
//!
//! - **Registry is the ledger**: issued keys are never deleted. "Already
//!   used" and "wrong device" answers depend on the record surviving.
//! - **Fixed activation window**: a key's expiry is set once, at first use.
//!   Renewals refresh the session cache but never extend the window.
//! - **Injected state, injected time**: callers own the shared state and
//!   pass `now` explicitly, so every transition is testable in isolation.

mod config;
mod error;
mod gatekeeper;
mod keygen;
mod registry;
mod session;
mod signature;
mod sweeper;

pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gatekeeper::{
    Gatekeeper, GateSnapshot, GrantKind, Rejection, ValidationRequest, ValidationResult,
};
pub use keygen::KeyGenerator;
pub use registry::{KeyRecord, KeyRegistry, Outcome};
pub use session::{SessionEntry, SessionIndex};
pub use signature::{ChecksumCodec, SignatureCodec};
pub use sweeper::{Sweeper, SweeperHandle};
