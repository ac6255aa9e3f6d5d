//! Core value types: chains, heights, identifiers, permalinks

pub mod coin_type;
pub mod identifiers;
pub mod permalink;
pub mod snapshot;

pub use coin_type::{CoinType, Network};
pub use identifiers::{Address, Did};
pub use permalink::{DataType, Permalink};
pub use snapshot::{Snapshot, SnapshotSet, Timestamp};
