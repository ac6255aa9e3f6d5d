//! Scriptable in-memory chain
//!
//! Heights, name bindings and balances are set by the test. Every call is
//! counted, and the peak number of concurrently outstanding calls is tracked
//! so fan-out limits can be asserted. Calls can be delayed (to exercise
//! timeouts) or made to fail.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voty_core::{Address, ChainEffects, ChainError, CoinType, NameRecord, Snapshot, Timestamp};

/// Block time of height 0
pub const GENESIS_TIME: u64 = 1_600_000_000;

/// Call counters, shareable between chains
#[derive(Debug, Default)]
pub struct CallStats {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl CallStats {
    /// Fresh counters
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Total calls started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls currently outstanding
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously outstanding calls
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.in_flight.store(0, Ordering::SeqCst);
        self.peak.store(0, Ordering::SeqCst);
    }

    fn enter(self: &Arc<Self>) -> InFlight {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlight(Arc::clone(self))
    }
}

struct InFlight(Arc<CallStats>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct ChainState {
    height: u64,
    block_secs: u64,
    // name -> bindings ordered by activation height
    names: HashMap<String, Vec<(u64, NameRecord)>>,
    // (contract, owner) -> balances ordered by height
    balances: HashMap<(String, Address), Vec<(u64, u128)>>,
    delay: Option<Duration>,
    failure: Option<String>,
}

/// In-memory chain serving one coin type
#[derive(Debug)]
pub struct MockChain {
    coin_type: CoinType,
    state: Mutex<ChainState>,
    stats: Arc<CallStats>,
}

impl MockChain {
    /// Chain at `height` with its own call counters
    pub fn new(coin_type: CoinType, height: u64) -> Self {
        Self::with_stats(coin_type, height, CallStats::new())
    }

    /// Chain at `height` reporting into shared counters
    pub fn with_stats(coin_type: CoinType, height: u64, stats: Arc<CallStats>) -> Self {
        Self {
            coin_type,
            state: Mutex::new(ChainState {
                height,
                block_secs: 12,
                names: HashMap::new(),
                balances: HashMap::new(),
                delay: None,
                failure: None,
            }),
            stats,
        }
    }

    /// Counters of this chain
    pub fn stats(&self) -> &Arc<CallStats> {
        &self.stats
    }

    /// Move the chain to `height`
    pub fn set_height(&self, height: u64) {
        self.state.lock().height = height;
    }

    /// Current height
    pub fn height(&self) -> Snapshot {
        Snapshot::new(self.state.lock().height)
    }

    /// Seconds between blocks
    pub fn set_block_secs(&self, secs: u64) {
        self.state.lock().block_secs = secs;
    }

    /// Block time of `height`
    pub fn time_of(&self, height: u64) -> Timestamp {
        Timestamp(GENESIS_TIME + height * self.state.lock().block_secs)
    }

    /// Bind `name` to `record` from height 0 on
    pub fn bind_name(&self, name: &str, record: NameRecord) {
        self.bind_name_from(name, record, 0);
    }

    /// Bind `name` to `record` from `height` on
    pub fn bind_name_from(&self, name: &str, record: NameRecord, height: u64) {
        let mut state = self.state.lock();
        let bindings = state.names.entry(name.to_string()).or_default();
        bindings.push((height, record));
        bindings.sort_by_key(|(from, _)| *from);
    }

    /// Set the balance of `owner` in `contract` from height 0 on
    pub fn set_balance(&self, contract: &str, owner: &Address, balance: u128) {
        self.set_balance_from(contract, owner, balance, 0);
    }

    /// Set the balance of `owner` in `contract` from `height` on
    pub fn set_balance_from(&self, contract: &str, owner: &Address, balance: u128, height: u64) {
        let mut state = self.state.lock();
        let history = state
            .balances
            .entry((contract.to_ascii_lowercase(), owner.clone()))
            .or_default();
        history.retain(|(from, _)| *from != height);
        history.push((height, balance));
        history.sort_by_key(|(from, _)| *from);
    }

    /// Delay every call by `delay`
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().delay = delay;
    }

    /// Make every call fail with `message`
    pub fn set_failure(&self, message: Option<&str>) {
        self.state.lock().failure = message.map(str::to_string);
    }

    async fn begin(&self) -> Result<InFlight, ChainError> {
        let guard = self.stats.enter();
        let (delay, failure) = {
            let state = self.state.lock();
            (state.delay, state.failure.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        match failure {
            Some(message) => Err(ChainError::unreachable(self.coin_type, message)),
            None => Ok(guard),
        }
    }
}

#[async_trait]
impl ChainEffects for MockChain {
    fn coin_type(&self) -> CoinType {
        self.coin_type
    }

    async fn current_height(&self) -> Result<Snapshot, ChainError> {
        let _call = self.begin().await?;
        Ok(self.height())
    }

    async fn height_timestamp(&self, snapshot: Snapshot) -> Result<Timestamp, ChainError> {
        let _call = self.begin().await?;
        Ok(self.time_of(snapshot.height()))
    }

    async fn resolve_name(
        &self,
        name: &str,
        snapshot: Snapshot,
    ) -> Result<Option<NameRecord>, ChainError> {
        let _call = self.begin().await?;
        let state = self.state.lock();
        Ok(state.names.get(name).and_then(|bindings| {
            bindings
                .iter()
                .rev()
                .find(|(from, _)| *from <= snapshot.height())
                .map(|(_, record)| record.clone())
        }))
    }

    async fn token_balance(
        &self,
        contract: &str,
        owner: &Address,
        snapshot: Snapshot,
    ) -> Result<u128, ChainError> {
        let _call = self.begin().await?;
        let state = self.state.lock();
        Ok(state
            .balances
            .get(&(contract.to_ascii_lowercase(), owner.clone()))
            .and_then(|history| {
                history
                    .iter()
                    .rev()
                    .find(|(from, _)| *from <= snapshot.height())
                    .map(|(_, balance)| *balance)
            })
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_name_bindings_follow_height() {
        let chain = MockChain::new(CoinType::CKB, 100);
        let first = NameRecord {
            address: "0x0000000000000000000000000000000000000001".into(),
            coin_type: None,
        };
        let second = NameRecord {
            address: "0x0000000000000000000000000000000000000002".into(),
            coin_type: None,
        };
        chain.bind_name_from("alice.bit", first.clone(), 10);
        chain.bind_name_from("alice.bit", second.clone(), 50);

        let at = |h| chain.resolve_name("alice.bit", Snapshot::new(h));
        assert_eq!(at(5).await.unwrap(), None);
        assert_eq!(at(10).await.unwrap(), Some(first));
        assert_eq!(at(80).await.unwrap(), Some(second));
        assert_eq!(chain.stats().calls(), 3);
        assert_eq!(chain.stats().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_balances_follow_height() {
        let chain = MockChain::new(CoinType::MATIC, 100);
        let owner = Address::from_bytes([3; 20]);
        chain.set_balance("0xToken", &owner, 40);
        chain.set_balance_from("0xtoken", &owner, 90, 60);

        let at = |h| chain.token_balance("0xTOKEN", &owner, Snapshot::new(h));
        assert_eq!(at(0).await.unwrap(), 40);
        assert_eq!(at(59).await.unwrap(), 40);
        assert_eq!(at(60).await.unwrap(), 90);
        let other = chain.token_balance("0xother", &owner, Snapshot::new(60));
        assert_eq!(other.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_unreachable() {
        let chain = MockChain::new(CoinType::ETH, 1);
        chain.set_failure(Some("rpc down"));
        assert!(matches!(
            chain.current_height().await,
            Err(ChainError::Unreachable { .. })
        ));
    }
}
