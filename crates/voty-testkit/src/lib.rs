//! Voty Testing Infrastructure
//!
//! In-memory implementations of the chain, storage and index effects, a
//! deterministic signer, document fixtures, and [`TestEnv`], which wires all
//! of them into a ready-to-use verifier.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod chain;
pub mod env;
pub mod fixtures;
pub mod signer;
pub mod storage;

pub use chain::{CallStats, MockChain, GENESIS_TIME};
pub use env::TestEnv;
pub use fixtures::*;
pub use signer::TestSigner;
pub use storage::{MemoryIndex, MemoryStorage};

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
