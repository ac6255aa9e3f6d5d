//! Bound weight trees

use crate::errors::EvaluationError;
use crate::functions::{EvaluationContext, FunctionRegistry, Weight};
use crate::resolver::ResolverRegistry;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeSet;
use voty_core::{CoinType, WeightNode, WeightOperator};

/// Weight tree whose leaves are bound to registry functions
#[derive(Debug)]
pub enum CompiledWeight {
    /// Sum or max over child trees
    Group {
        /// Combinator
        operator: WeightOperator,
        /// Children
        operands: Vec<CompiledWeight>,
    },
    /// Bound function call
    Leaf {
        /// Function name, for logs and errors
        function: String,
        /// Executable leaf
        weight: Box<dyn Weight>,
    },
}

impl CompiledWeight {
    /// Bind every leaf of `node`
    pub fn compile(
        node: &WeightNode,
        functions: &FunctionRegistry,
        resolvers: &ResolverRegistry,
    ) -> Result<Self, EvaluationError> {
        match node {
            WeightNode::Group(group) => Ok(Self::Group {
                operator: group.operator,
                operands: group
                    .operands
                    .iter()
                    .map(|operand| Self::compile(operand, functions, resolvers))
                    .collect::<Result<_, _>>()?,
            }),
            WeightNode::Leaf(call) => Ok(Self::Leaf {
                function: call.function.clone(),
                weight: functions
                    .weight(&call.function)?
                    .bind(&call.arguments, resolvers)?,
            }),
        }
    }

    /// Union of the chains every leaf reads
    pub fn required_coin_types(&self) -> BTreeSet<CoinType> {
        match self {
            Self::Group { operands, .. } => operands
                .iter()
                .flat_map(CompiledWeight::required_coin_types)
                .collect(),
            Self::Leaf { weight, .. } => weight.required_coin_types(),
        }
    }

    /// Whether any leaf resolves the evaluated identity
    pub fn reads_identity(&self) -> bool {
        match self {
            Self::Group { operands, .. } => operands.iter().any(CompiledWeight::reads_identity),
            Self::Leaf { weight, .. } => weight.reads_identity(),
        }
    }

    /// Fold the tree; an empty group weighs zero
    pub fn evaluate<'a>(
        &'a self,
        ctx: &'a EvaluationContext<'a>,
    ) -> BoxFuture<'a, Result<f64, EvaluationError>> {
        async move {
            match self {
                Self::Leaf { function, weight } => {
                    let value = weight.execute(ctx).await?;
                    if !value.is_finite() || value < 0.0 {
                        return Err(EvaluationError::InvalidWeight {
                            function: function.clone(),
                            value,
                        });
                    }
                    tracing::trace!(%function, value, "weight evaluated");
                    Ok(value)
                }
                Self::Group { operator, operands } => {
                    let mut total = 0.0_f64;
                    for operand in operands {
                        let value = operand.evaluate(ctx).await?;
                        total = match operator {
                            WeightOperator::Sum => total + value,
                            WeightOperator::Max => total.max(value),
                        };
                    }
                    if !total.is_finite() {
                        let group = match operator {
                            WeightOperator::Sum => "sum",
                            WeightOperator::Max => "max",
                        };
                        return Err(EvaluationError::InvalidWeight {
                            function: group.to_string(),
                            value: total,
                        });
                    }
                    Ok(total)
                }
            }
        }
        .boxed()
    }
}
