//! Sub-identifier allowlists (`dev.alice.bit` under `alice.bit`)
//!
//! An empty prefix list admits every direct sub-identifier of the suffix.
//! The declared chains are those of the suffix's resolver family.

use super::args::Args;
use super::{BooleanFunction, EvaluationContext, Predicate, Weight, WeightFunction};
use crate::errors::EvaluationError;
use crate::resolver::ResolverRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use voty_core::{CoinType, Did};

/// `prefixes_dot_suffix_exact_match(suffix, prefixes)`
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixesDotSuffixExactMatch;

/// `prefixes_dot_suffix_fixed_power(suffix, prefixes, power)`
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixesDotSuffixFixedPower;

#[derive(Debug)]
struct SubIdentifiers {
    suffix: String,
    prefixes: BTreeSet<String>,
    coin_types: BTreeSet<CoinType>,
}

impl SubIdentifiers {
    fn bind(
        args: &Args<'_>,
        resolvers: &ResolverRegistry,
    ) -> Result<Self, EvaluationError> {
        let suffix = args.string(0)?.trim_start_matches('.');
        if suffix.is_empty() {
            return Err(args.invalid(0, "suffix must not be empty"));
        }
        Ok(Self {
            suffix: suffix.to_string(),
            prefixes: args.strings(1)?.into_iter().map(str::to_string).collect(),
            coin_types: args.family_coin_types(suffix, resolvers)?,
        })
    }

    fn matches(&self, did: &Did) -> bool {
        match did.strip_suffix(&self.suffix) {
            Some(prefix) if self.prefixes.is_empty() => !prefix.contains('.'),
            Some(prefix) => self.prefixes.contains(prefix),
            None => false,
        }
    }
}

#[derive(Debug)]
struct SubIdentifierPower {
    members: SubIdentifiers,
    power: f64,
}

impl BooleanFunction for PrefixesDotSuffixExactMatch {
    fn name(&self) -> &'static str {
        "prefixes_dot_suffix_exact_match"
    }

    fn bind(
        &self,
        arguments: &[Value],
        resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Predicate>, EvaluationError> {
        let args = Args::new(self.name(), arguments, 2)?;
        Ok(Box::new(SubIdentifiers::bind(&args, resolvers)?))
    }
}

impl WeightFunction for PrefixesDotSuffixFixedPower {
    fn name(&self) -> &'static str {
        "prefixes_dot_suffix_fixed_power"
    }

    fn bind(
        &self,
        arguments: &[Value],
        resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Weight>, EvaluationError> {
        let args = Args::new(self.name(), arguments, 3)?;
        Ok(Box::new(SubIdentifierPower {
            members: SubIdentifiers::bind(&args, resolvers)?,
            power: args.amount(2)?,
        }))
    }
}

#[async_trait]
impl Predicate for SubIdentifiers {
    fn required_coin_types(&self) -> BTreeSet<CoinType> {
        self.coin_types.clone()
    }

    async fn execute(&self, ctx: &EvaluationContext<'_>) -> Result<bool, EvaluationError> {
        Ok(self.matches(ctx.did))
    }
}

#[async_trait]
impl Weight for SubIdentifierPower {
    fn required_coin_types(&self) -> BTreeSet<CoinType> {
        self.members.coin_types.clone()
    }

    async fn execute(&self, ctx: &EvaluationContext<'_>) -> Result<f64, EvaluationError> {
        Ok(if self.members.matches(ctx.did) {
            self.power
        } else {
            0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(prefixes: &[&str]) -> SubIdentifiers {
        SubIdentifiers {
            suffix: "alice.bit".into(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            coin_types: BTreeSet::from([CoinType::CKB]),
        }
    }

    fn did(value: &str) -> Did {
        Did::parse(value).unwrap()
    }

    #[test]
    fn test_listed_prefixes() {
        let members = members(&["dev", "ops"]);
        assert!(members.matches(&did("dev.alice.bit")));
        assert!(members.matches(&did("ops.alice.bit")));
        assert!(!members.matches(&did("qa.alice.bit")));
        assert!(!members.matches(&did("alice.bit")));
        assert!(!members.matches(&did("dev.bob.bit")));
    }

    #[test]
    fn test_empty_list_admits_direct_children_only() {
        let members = members(&[]);
        assert!(members.matches(&did("anyone.alice.bit")));
        assert!(!members.matches(&did("deep.child.alice.bit")));
        assert!(!members.matches(&did("alice.bit")));
    }

    #[test]
    fn test_empty_prefix_entry_is_not_allow_all() {
        let members = members(&[""]);
        assert!(!members.matches(&did("anyone.alice.bit")));
    }
}
