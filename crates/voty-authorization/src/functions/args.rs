//! Positional argument decoding for built-in functions

use crate::errors::EvaluationError;
use crate::resolver::ResolverRegistry;
use serde_json::Value;
use std::collections::BTreeSet;
use voty_core::{Address, CoinType, Did};

/// Arguments of one leaf, with the function name for error messages
pub(crate) struct Args<'a> {
    function: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Require exactly `arity` positional arguments
    pub(crate) fn new(
        function: &'static str,
        values: &'a [Value],
        arity: usize,
    ) -> Result<Self, EvaluationError> {
        if values.len() != arity {
            return Err(EvaluationError::invalid_arguments(
                function,
                format!("expected {arity} arguments, got {}", values.len()),
            ));
        }
        Ok(Self { function, values })
    }

    pub(crate) fn invalid(&self, index: usize, message: impl std::fmt::Display) -> EvaluationError {
        EvaluationError::invalid_arguments(self.function, format!("argument {index}: {message}"))
    }

    fn value(&self, index: usize) -> &'a Value {
        static MISSING: Value = Value::Null;
        self.values.get(index).unwrap_or(&MISSING)
    }

    pub(crate) fn string(&self, index: usize) -> Result<&'a str, EvaluationError> {
        self.value(index)
            .as_str()
            .ok_or_else(|| self.invalid(index, "expected string"))
    }

    pub(crate) fn strings(&self, index: usize) -> Result<Vec<&'a str>, EvaluationError> {
        let items = self
            .value(index)
            .as_array()
            .ok_or_else(|| self.invalid(index, "expected array of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| self.invalid(index, "expected array of strings"))
            })
            .collect()
    }

    pub(crate) fn dids(&self, index: usize) -> Result<BTreeSet<Did>, EvaluationError> {
        self.strings(index)?
            .into_iter()
            .map(|raw| Did::parse(raw).map_err(|e| self.invalid(index, e)))
            .collect()
    }

    /// Finite, non-negative number
    pub(crate) fn amount(&self, index: usize) -> Result<f64, EvaluationError> {
        let value = match self.value(index) {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| self.invalid(index, "expected number"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(self.invalid(index, format!("{value} is not a non-negative number")));
        }
        Ok(value)
    }

    /// Integer token amount, given as JSON integer or decimal string
    pub(crate) fn token_amount(&self, index: usize) -> Result<u128, EvaluationError> {
        match self.value(index) {
            Value::Number(n) => n.as_u64().map(u128::from),
            Value::String(s) => s.trim().parse::<u128>().ok(),
            _ => None,
        }
        .ok_or_else(|| self.invalid(index, "expected unsigned integer"))
    }

    pub(crate) fn small_integer(&self, index: usize) -> Result<u32, EvaluationError> {
        self.value(index)
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| self.invalid(index, "expected small unsigned integer"))
    }

    pub(crate) fn coin_type(&self, index: usize) -> Result<CoinType, EvaluationError> {
        let coin_type: CoinType = serde_json::from_value(self.value(index).clone())
            .map_err(|e| self.invalid(index, e))?;
        if coin_type.name().is_none() {
            return Err(self.invalid(index, format!("unknown coin type {coin_type}")));
        }
        Ok(coin_type)
    }

    pub(crate) fn contract(&self, index: usize) -> Result<Address, EvaluationError> {
        Address::parse(self.string(index)?).map_err(|e| self.invalid(index, e))
    }

    /// Chains needed to resolve identifiers of `suffix`'s family
    pub(crate) fn family_coin_types(
        &self,
        suffix: &str,
        resolvers: &ResolverRegistry,
    ) -> Result<BTreeSet<CoinType>, EvaluationError> {
        let family = suffix.rsplit('.').next().unwrap_or(suffix);
        resolvers
            .family(family)
            .map(|resolver| resolver.required_coin_types())
            .ok_or_else(|| {
                EvaluationError::invalid_arguments(
                    self.function,
                    format!("no resolver for identifiers ending in .{family}"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arity_and_types() {
        let values = [json!("bit"), json!(["a", 1])];
        assert!(Args::new("f", &values, 3).is_err());

        let args = Args::new("f", &values, 2).unwrap();
        assert_eq!(args.string(0).unwrap(), "bit");
        assert!(args.string(1).is_err());
        assert!(args.strings(1).is_err());
    }

    #[test]
    fn test_numbers() {
        let values = [
            json!(10),
            json!("2.5"),
            json!(-1),
            json!("340282366920938463463374607431768211455"),
        ];
        let args = Args::new("f", &values, 4).unwrap();
        assert_eq!(args.amount(0).unwrap(), 10.0);
        assert_eq!(args.amount(1).unwrap(), 2.5);
        assert!(args.amount(2).is_err());
        assert_eq!(args.token_amount(3).unwrap(), u128::MAX);
        assert!(args.token_amount(1).is_err());
    }

    #[test]
    fn test_coin_type_must_be_known() {
        let values = [json!(60), json!("309"), json!(1234)];
        let args = Args::new("f", &values, 3).unwrap();
        assert_eq!(args.coin_type(0).unwrap(), CoinType::ETH);
        assert_eq!(args.coin_type(1).unwrap(), CoinType::CKB);
        assert!(args.coin_type(2).is_err());
    }
}
