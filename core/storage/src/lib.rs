//! Storage backend abstraction for credvault.
//!
//! Each account owns at most two artifacts: the account record and the
//! vault record. Backends store them as opaque byte blobs addressed by
//! [`ArtifactId`].
//!
//! # Design Principles
//! - Backend isolation: no cipher or format logic lives here
//! - Synchronous operations: every call blocks until it completes
//! - Absent artifacts are a normal state, reported as `None`/`false`

pub mod backend;
pub mod local;
pub mod memory;

pub use backend::{ArtifactId, ArtifactKind, StorageBackend};
pub use local::LocalStorage;
pub use memory::MemoryStorage;
