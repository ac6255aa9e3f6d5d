//! Asset-ownership functions
//!
//! Balances are read for the evaluated identity's resolved address at the
//! snapshot of the token's chain. Resolution itself may need further chains;
//! the leaves report that they read the identity, and the evaluator adds the
//! identifier's resolver chains to the coverage check.

use super::args::Args;
use super::{BooleanFunction, EvaluationContext, Predicate, Weight, WeightFunction};
use crate::errors::EvaluationError;
use crate::resolver::ResolverRegistry;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use voty_core::{Address, CoinType};

/// `erc20_balance_at_least(coin_type, contract, min)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Erc20BalanceAtLeast;

/// `owns_erc721(coin_type, contract)`
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnsErc721;

/// `erc20_balance(coin_type, contract, decimals)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Erc20Balance;

#[derive(Debug)]
struct TokenHolding {
    coin_type: CoinType,
    contract: Address,
}

impl TokenHolding {
    fn bind(args: &Args<'_>) -> Result<Self, EvaluationError> {
        Ok(Self {
            coin_type: args.coin_type(0)?,
            contract: args.contract(1)?,
        })
    }

    async fn balance(&self, ctx: &EvaluationContext<'_>) -> Result<u128, EvaluationError> {
        let snapshot = ctx.snapshot(self.coin_type)?;
        let identity = ctx.identity().await?;
        let balance = ctx
            .chains()
            .token_balance(
                self.coin_type,
                self.contract.as_str(),
                &identity.address,
                snapshot,
            )
            .await?;
        tracing::trace!(
            coin_type = %self.coin_type,
            contract = %self.contract,
            balance,
            "token balance read"
        );
        Ok(balance)
    }
}

#[derive(Debug)]
struct MinimumBalance {
    holding: TokenHolding,
    minimum: u128,
}

#[derive(Debug)]
struct BalanceWeight {
    holding: TokenHolding,
    scale: f64,
}

impl BooleanFunction for Erc20BalanceAtLeast {
    fn name(&self) -> &'static str {
        "erc20_balance_at_least"
    }

    fn bind(
        &self,
        arguments: &[Value],
        _resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Predicate>, EvaluationError> {
        let args = Args::new(self.name(), arguments, 3)?;
        Ok(Box::new(MinimumBalance {
            holding: TokenHolding::bind(&args)?,
            minimum: args.token_amount(2)?,
        }))
    }
}

impl BooleanFunction for OwnsErc721 {
    fn name(&self) -> &'static str {
        "owns_erc721"
    }

    fn bind(
        &self,
        arguments: &[Value],
        _resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Predicate>, EvaluationError> {
        let args = Args::new(self.name(), arguments, 2)?;
        Ok(Box::new(MinimumBalance {
            holding: TokenHolding::bind(&args)?,
            minimum: 1,
        }))
    }
}

impl WeightFunction for Erc20Balance {
    fn name(&self) -> &'static str {
        "erc20_balance"
    }

    fn bind(
        &self,
        arguments: &[Value],
        _resolvers: &ResolverRegistry,
    ) -> Result<Box<dyn Weight>, EvaluationError> {
        let args = Args::new(self.name(), arguments, 3)?;
        let decimals = args.small_integer(2)?;
        if decimals > 36 {
            return Err(args.invalid(2, format!("{decimals} decimals is out of range")));
        }
        Ok(Box::new(BalanceWeight {
            holding: TokenHolding::bind(&args)?,
            scale: 10f64.powi(decimals as i32),
        }))
    }
}

#[async_trait]
impl Predicate for MinimumBalance {
    fn required_coin_types(&self) -> BTreeSet<CoinType> {
        BTreeSet::from([self.holding.coin_type])
    }

    fn reads_identity(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &EvaluationContext<'_>) -> Result<bool, EvaluationError> {
        Ok(self.holding.balance(ctx).await? >= self.minimum)
    }
}

#[async_trait]
impl Weight for BalanceWeight {
    fn required_coin_types(&self) -> BTreeSet<CoinType> {
        BTreeSet::from([self.holding.coin_type])
    }

    fn reads_identity(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &EvaluationContext<'_>) -> Result<f64, EvaluationError> {
        Ok(self.holding.balance(ctx).await? as f64 / self.scale)
    }
}
