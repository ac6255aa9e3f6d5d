//! Chain gateway
//!
//! Routes calls to the handler registered for a coin type and bounds every
//! call with the configured timeout. An expired call surfaces as
//! `ChainError::Timeout`; callers treat it like any other unreachable chain.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use voty_core::{Address, ChainEffects, ChainError, CoinType, NameRecord, Snapshot, Timestamp};

/// Registered chain handlers plus the per-call timeout
#[derive(Clone)]
pub struct ChainGateway {
    handlers: HashMap<CoinType, Arc<dyn ChainEffects>>,
    timeout: Duration,
}

impl ChainGateway {
    /// Create a gateway without handlers
    pub fn new(timeout: Duration) -> Self {
        Self {
            handlers: HashMap::new(),
            timeout,
        }
    }

    /// Register a handler, replacing any handler for the same chain
    pub fn register(&mut self, handler: Arc<dyn ChainEffects>) {
        self.handlers.insert(handler.coin_type(), handler);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_handler(mut self, handler: Arc<dyn ChainEffects>) -> Self {
        self.register(handler);
        self
    }

    /// Whether a handler is registered for `coin_type`
    pub fn supports(&self, coin_type: CoinType) -> bool {
        self.handlers.contains_key(&coin_type)
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn handler(&self, coin_type: CoinType) -> Result<&Arc<dyn ChainEffects>, ChainError> {
        self.handlers
            .get(&coin_type)
            .ok_or(ChainError::UnsupportedChain { coin_type })
    }

    async fn bounded<T>(
        &self,
        coin_type: CoinType,
        call: impl Future<Output = Result<T, ChainError>>,
    ) -> Result<T, ChainError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    %coin_type,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "chain call timed out"
                );
                Err(ChainError::Timeout {
                    coin_type,
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Current height of `coin_type`
    pub async fn current_height(&self, coin_type: CoinType) -> Result<Snapshot, ChainError> {
        let handler = self.handler(coin_type)?;
        self.bounded(coin_type, handler.current_height()).await
    }

    /// Block time at `snapshot` on `coin_type`
    pub async fn height_timestamp(
        &self,
        coin_type: CoinType,
        snapshot: Snapshot,
    ) -> Result<Timestamp, ChainError> {
        let handler = self.handler(coin_type)?;
        self.bounded(coin_type, handler.height_timestamp(snapshot)).await
    }

    /// Name lookup on `coin_type` as of `snapshot`
    pub async fn resolve_name(
        &self,
        coin_type: CoinType,
        name: &str,
        snapshot: Snapshot,
    ) -> Result<Option<NameRecord>, ChainError> {
        let handler = self.handler(coin_type)?;
        self.bounded(coin_type, handler.resolve_name(name, snapshot)).await
    }

    /// Token balance on `coin_type` as of `snapshot`
    pub async fn token_balance(
        &self,
        coin_type: CoinType,
        contract: &str,
        owner: &Address,
        snapshot: Snapshot,
    ) -> Result<u128, ChainError> {
        let handler = self.handler(coin_type)?;
        self.bounded(coin_type, handler.token_balance(contract, owner, snapshot)).await
    }
}

impl fmt::Debug for ChainGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chains: Vec<_> = self.handlers.keys().copied().collect();
        chains.sort();
        f.debug_struct("ChainGateway")
            .field("chains", &chains)
            .field("timeout", &self.timeout)
            .finish()
    }
}
