//! Chain heights and per-chain height sets

use super::CoinType;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Height of a chain at a specific point in its history
///
/// Serialized as a decimal string so heights survive JSON consumers that
/// only have double-precision numbers. Heights are bounded by `u64`; larger
/// values are rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Snapshot(u64);

impl Snapshot {
    /// Create a snapshot at the given height
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// Height as integer
    pub fn height(self) -> u64 {
        self.0
    }

    /// Absolute distance between two heights
    pub fn distance(self, other: Snapshot) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snapshot {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Snapshot)
    }
}

impl From<u64> for Snapshot {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl Visitor<'_> for SnapshotVisitor {
            type Value = Snapshot;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative chain height")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snapshot, E> {
                Ok(Snapshot(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snapshot, E> {
                u64::try_from(v)
                    .map(Snapshot)
                    .map_err(|_| E::custom(format!("negative chain height: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snapshot, E> {
                v.parse()
                    .map_err(|_| E::custom(format!("invalid chain height: {v}")))
            }
        }

        deserializer.deserialize_any(SnapshotVisitor)
    }
}

/// Wall-clock time of a block, in seconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Seconds since the Unix epoch
    pub fn secs(self) -> u64 {
        self.0
    }

    /// Timestamp shifted forward by `secs`, saturating
    pub fn add_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

/// Mapping `coin type → snapshot` accompanying authorization-bearing documents
///
/// Keyed, never positional: a height is always attributed to the chain it
/// was fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotSet(BTreeMap<CoinType, Snapshot>);

impl SnapshotSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot recorded for a chain
    pub fn get(&self, coin_type: CoinType) -> Option<Snapshot> {
        self.0.get(&coin_type).copied()
    }

    /// Record the snapshot of a chain, returning the previous one
    pub fn insert(&mut self, coin_type: CoinType, snapshot: Snapshot) -> Option<Snapshot> {
        self.0.insert(coin_type, snapshot)
    }

    /// Builder-style insert
    pub fn with(mut self, coin_type: CoinType, snapshot: Snapshot) -> Self {
        self.insert(coin_type, snapshot);
        self
    }

    /// Whether a snapshot is recorded for the chain
    pub fn contains(&self, coin_type: CoinType) -> bool {
        self.0.contains_key(&coin_type)
    }

    /// Chains of `required` that have no snapshot in this set
    pub fn missing(&self, required: &BTreeSet<CoinType>) -> BTreeSet<CoinType> {
        required
            .iter()
            .filter(|coin_type| !self.contains(**coin_type))
            .copied()
            .collect()
    }

    /// Copy entries of `other` for chains not yet present here
    pub fn fill_from(&mut self, other: &SnapshotSet) {
        for (coin_type, snapshot) in other.iter() {
            self.0.entry(coin_type).or_insert(snapshot);
        }
    }

    /// Chains covered by this set
    pub fn coin_types(&self) -> BTreeSet<CoinType> {
        self.0.keys().copied().collect()
    }

    /// Iterate over `(coin type, snapshot)` pairs in coin type order
    pub fn iter(&self) -> impl Iterator<Item = (CoinType, Snapshot)> + '_ {
        self.0.iter().map(|(c, s)| (*c, *s))
    }

    /// Number of chains in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(CoinType, Snapshot)> for SnapshotSet {
    fn from_iter<I: IntoIterator<Item = (CoinType, Snapshot)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_set_wire_format() {
        let set = SnapshotSet::new()
            .with(CoinType::ETH, Snapshot::new(16_000_000))
            .with(CoinType::CKB, Snapshot::new(8_000_000));
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"60":"16000000","309":"8000000"}"#);

        let parsed: SnapshotSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_snapshot_accepts_numbers() {
        let snapshot: Snapshot = serde_json::from_str("42").unwrap();
        assert_eq!(snapshot.height(), 42);
        assert!(serde_json::from_str::<Snapshot>("-1").is_err());
        assert!(serde_json::from_str::<Snapshot>("\"12a\"").is_err());
    }

    #[test]
    fn test_height_beyond_u64_rejected() {
        let max: Snapshot = serde_json::from_str("\"18446744073709551615\"").unwrap();
        assert_eq!(max.height(), u64::MAX);
        assert!(serde_json::from_str::<Snapshot>("\"18446744073709551616\"").is_err());
        assert!(serde_json::from_str::<Snapshot>("18446744073709551616").is_err());
        assert!("18446744073709551616".parse::<Snapshot>().is_err());
    }

    #[test]
    fn test_missing_coin_types() {
        let set = SnapshotSet::new().with(CoinType::ETH, Snapshot::new(1));
        let required: BTreeSet<_> = [CoinType::ETH, CoinType::BSC].into_iter().collect();
        assert_eq!(
            set.missing(&required),
            [CoinType::BSC].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_fill_keeps_existing_entries() {
        let mut set = SnapshotSet::new().with(CoinType::ETH, Snapshot::new(1));
        let fresh = SnapshotSet::new()
            .with(CoinType::ETH, Snapshot::new(9))
            .with(CoinType::BSC, Snapshot::new(7));
        set.fill_from(&fresh);
        assert_eq!(set.get(CoinType::ETH), Some(Snapshot::new(1)));
        assert_eq!(set.get(CoinType::BSC), Some(Snapshot::new(7)));
    }

    #[test]
    fn test_distance_is_symmetric() {
        assert_eq!(Snapshot::new(100).distance(Snapshot::new(94)), 6);
        assert_eq!(Snapshot::new(94).distance(Snapshot::new(100)), 6);
    }
}
