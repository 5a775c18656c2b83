//! Credential vault engine for credvault.
//!
//! This module provides:
//! - Account registration and master-password verification
//! - Two-layer encrypted credential storage (per-secret session key,
//!   whole-vault envelope key)
//! - Session handling with in-memory credentials and key zeroization
//! - Expiration tracking, search and summary statistics
//!
//! # Architecture
//! The vault module sits between the presentation layer and the storage
//! backends. Every cipher and format decision is made here; backends see
//! opaque bytes.

pub mod account;
pub mod config;
pub mod credentials;
pub mod entry;
pub mod expiry;
pub mod manager;
pub mod session;

pub use account::{AccountRecord, AccountStore};
pub use config::SessionConfig;
pub use credentials::CredentialStore;
pub use entry::{CredentialEntry, StoredCredential};
pub use expiry::{CredentialStats, ExpirationStatus, ExpiringCredential};
pub use manager::VaultManager;
pub use session::{CredentialSession, SessionState};
