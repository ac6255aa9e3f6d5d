//! Complete verification environment over in-memory effects

use crate::chain::{CallStats, MockChain};
use crate::signer::TestSigner;
use crate::storage::{MemoryIndex, MemoryStorage};
use serde::Serialize;
use std::sync::Arc;
use voty_authorization::Verifier;
use voty_core::documents::Taggable;
use voty_core::{Authorized, CoinType, Permalink, Proved, VerifierConfig};

/// Starting height of the Ethereum mock
pub const ETH_HEIGHT: u64 = 18_000_000;
/// Starting height of the CKB mock
pub const CKB_HEIGHT: u64 = 9_000_000;
/// Starting height of the Arweave mock
pub const AR_HEIGHT: u64 = 1_200_000;
/// Starting height of the Polygon mock
pub const MATIC_HEIGHT: u64 = 48_000_000;
/// Starting height of the BNB Chain mock
pub const BSC_HEIGHT: u64 = 32_000_000;

/// Mock chains for every known coin type plus storage and index
#[derive(Debug)]
pub struct TestEnv {
    /// Counters shared by all chains
    pub stats: Arc<CallStats>,
    /// Ethereum
    pub eth: Arc<MockChain>,
    /// Nervos CKB
    pub ckb: Arc<MockChain>,
    /// Arweave
    pub ar: Arc<MockChain>,
    /// Polygon
    pub matic: Arc<MockChain>,
    /// BNB Chain
    pub bsc: Arc<MockChain>,
    /// Content storage
    pub storage: Arc<MemoryStorage>,
    /// Verified document index
    pub index: Arc<MemoryIndex>,
    /// Configuration handed to verifiers
    pub config: VerifierConfig,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    /// Environment with default configuration
    pub fn new() -> Self {
        Self::with_config(VerifierConfig::default())
    }

    /// Environment with `config`
    pub fn with_config(config: VerifierConfig) -> Self {
        let stats = CallStats::new();
        let chain = |coin_type, height| {
            Arc::new(MockChain::with_stats(coin_type, height, Arc::clone(&stats)))
        };
        Self {
            eth: chain(CoinType::ETH, ETH_HEIGHT),
            ckb: chain(CoinType::CKB, CKB_HEIGHT),
            ar: chain(CoinType::AR, AR_HEIGHT),
            matic: chain(CoinType::MATIC, MATIC_HEIGHT),
            bsc: chain(CoinType::BSC, BSC_HEIGHT),
            stats,
            storage: Arc::new(MemoryStorage::new()),
            index: Arc::new(MemoryIndex::new()),
            config,
        }
    }

    /// All mock chains
    pub fn chains(&self) -> [&Arc<MockChain>; 5] {
        [&self.eth, &self.ckb, &self.ar, &self.matic, &self.bsc]
    }

    /// Mock chain serving `coin_type`
    pub fn chain(&self, coin_type: CoinType) -> &Arc<MockChain> {
        match coin_type {
            CoinType::ETH => &self.eth,
            CoinType::CKB => &self.ckb,
            CoinType::AR => &self.ar,
            CoinType::MATIC => &self.matic,
            CoinType::BSC => &self.bsc,
            other => panic!("no mock chain for coin type {other}"),
        }
    }

    /// Current height of `coin_type`
    pub fn height(&self, coin_type: CoinType) -> u64 {
        self.chain(coin_type).height().height()
    }

    /// Verifier wired to this environment
    pub fn verifier(&self) -> Verifier {
        self.chains()
            .into_iter()
            .fold(Verifier::builder(self.config.clone()), |builder, chain| {
                builder.chain(Arc::clone(chain) as Arc<dyn voty_core::ChainEffects>)
            })
            .storage(Arc::clone(&self.storage) as Arc<dyn voty_core::ContentStorageEffects>)
            .index(Arc::clone(&self.index) as Arc<dyn voty_core::DocumentIndexEffects>)
            .build()
            .expect("test verifier builds")
    }

    /// Bind `signer`'s identifier on its family's chain
    pub fn register(&self, signer: &TestSigner) {
        let chain = match signer.did().suffix() {
            "eth" => &self.eth,
            _ => &self.ckb,
        };
        chain.bind_name(signer.did().as_str(), signer.name_record());
    }

    /// Create and register a signer
    pub fn signer(&self, did: &str, seed: u8) -> TestSigner {
        let signer = TestSigner::new(did, seed);
        self.register(&signer);
        signer
    }

    /// Sign `document` at the current height of `coin_type`
    pub fn sign_now<T: Serialize>(
        &self,
        signer: &TestSigner,
        document: T,
        coin_type: CoinType,
    ) -> Proved<Authorized<T>> {
        signer.sign(document, coin_type, self.height(coin_type))
    }

    /// Anchor `document` in storage at the current Arweave height
    pub fn publish<T: Serialize + Taggable>(&self, document: &Proved<Authorized<T>>) -> Permalink {
        self.storage.publish(document, self.height(CoinType::AR))
    }

    /// Advance every chain by `blocks`
    pub fn advance(&self, blocks: u64) {
        for chain in self.chains() {
            chain.set_height(chain.height().height() + blocks);
        }
    }
}
