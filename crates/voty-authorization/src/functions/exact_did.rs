//! Explicit identifier allowlists

use super::args::Args;
use super::{BooleanFunction, EvaluationContext, Predicate, Weight, WeightFunction};
use crate::errors::EvaluationError;
use crate::resolver::ResolverRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use voty_core::{CoinType, Did};

/// `exact_did(dids)`: the identity is one of `dids`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactDid;

/// `exact_did_fixed_power(dids, power)`: `power` for listed identities, else 0
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactDidFixedPower;

#[derive(Debug)]
struct Allowlist {
    dids: BTreeSet<Did>,
}

#[derive(Debug)]
struct FixedPower {
    allowlist: Allowlist,
    power: f64,
}

impl BooleanFunction for ExactDid {
    fn name(&self) -> &'static str {
        "exact_did"
    }

    fn bind(
        &self,
        arguments: &[Value],
        _resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Predicate>, EvaluationError> {
        let args = Args::new("exact_did", arguments, 1)?;
        Ok(Box::new(Allowlist { dids: args.dids(0)? }))
    }
}

impl WeightFunction for ExactDidFixedPower {
    fn name(&self) -> &'static str {
        "exact_did_fixed_power"
    }

    fn bind(
        &self,
        arguments: &[Value],
        _resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Weight>, EvaluationError> {
        let args = Args::new("exact_did_fixed_power", arguments, 2)?;
        Ok(Box::new(FixedPower {
            allowlist: Allowlist { dids: args.dids(0)? },
            power: args.amount(1)?,
        }))
    }
}

#[async_trait]
impl Predicate for Allowlist {
    // Membership is decided on the identifier itself.
    fn required_coin_types(&self) -> BTreeSet<CoinType> {
        BTreeSet::new()
    }

    async fn execute(&self, ctx: &EvaluationContext<'_>) -> Result<bool, EvaluationError> {
        Ok(self.dids.contains(ctx.did))
    }
}

#[async_trait]
impl Weight for FixedPower {
    fn required_coin_types(&self) -> BTreeSet<CoinType> {
        BTreeSet::new()
    }

    async fn execute(&self, ctx: &EvaluationContext<'_>) -> Result<f64, EvaluationError> {
        Ok(if self.allowlist.dids.contains(ctx.did) {
            self.power
        } else {
            0.0
        })
    }
}
