//! Effect interfaces for external collaborators
//!
//! The engine never talks to a chain or a storage backend directly; handlers
//! implementing these traits are passed in at construction time so tests can
//! substitute doubles.

pub mod chain;
pub mod storage;

pub use chain::{ChainEffects, NameRecord};
pub use storage::{ContentStorageEffects, DocumentIndexEffects};
