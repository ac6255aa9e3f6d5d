//! Bound boolean policy trees

use crate::errors::EvaluationError;
use crate::functions::{EvaluationContext, FunctionRegistry, Predicate};
use crate::resolver::ResolverRegistry;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeSet;
use voty_core::{BooleanOperator, CoinType, PolicyNode};

/// Policy tree whose leaves are bound to registry functions
#[derive(Debug)]
pub enum CompiledPolicy {
    /// AND/OR over child trees
    Group {
        /// Combinator
        operator: BooleanOperator,
        /// Children, in document order
        operands: Vec<CompiledPolicy>,
    },
    /// Bound function call
    Leaf {
        /// Function name, for logs
        function: String,
        /// Executable leaf
        predicate: Box<dyn Predicate>,
    },
}

impl CompiledPolicy {
    /// Bind every leaf of `node`; fails on the first unknown function or bad argument list
    pub fn compile(
        node: &PolicyNode,
        functions: &FunctionRegistry,
        resolvers: &ResolverRegistry,
    ) -> Result<Self, EvaluationError> {
        match node {
            PolicyNode::Group(group) => Ok(Self::Group {
                operator: group.operator,
                operands: group
                    .operands
                    .iter()
                    .map(|operand| Self::compile(operand, functions, resolvers))
                    .collect::<Result<_, _>>()?,
            }),
            PolicyNode::Predicate(call) => Ok(Self::Leaf {
                function: call.function.clone(),
                predicate: functions
                    .boolean(&call.function)?
                    .bind(&call.arguments, resolvers)?,
            }),
        }
    }

    /// Union of the chains every leaf reads, regardless of short-circuiting
    pub fn required_coin_types(&self) -> BTreeSet<CoinType> {
        let mut required = BTreeSet::new();
        self.collect_coin_types(&mut required);
        required
    }

    /// Whether any leaf resolves the evaluated identity
    pub fn reads_identity(&self) -> bool {
        match self {
            Self::Group { operands, .. } => operands.iter().any(CompiledPolicy::reads_identity),
            Self::Leaf { predicate, .. } => predicate.reads_identity(),
        }
    }

    fn collect_coin_types(&self, into: &mut BTreeSet<CoinType>) {
        match self {
            Self::Group { operands, .. } => {
                for operand in operands {
                    operand.collect_coin_types(into);
                }
            }
            Self::Leaf { predicate, .. } => into.extend(predicate.required_coin_types()),
        }
    }

    /// Evaluate left to right; AND stops at the first false, OR at the first true
    ///
    /// An empty AND is true and an empty OR is false.
    pub fn evaluate<'a>(
        &'a self,
        ctx: &'a EvaluationContext<'a>,
    ) -> BoxFuture<'a, Result<bool, EvaluationError>> {
        async move {
            match self {
                Self::Leaf {
                    function,
                    predicate,
                } => {
                    let result = predicate.execute(ctx).await?;
                    tracing::trace!(%function, result, "predicate evaluated");
                    Ok(result)
                }
                Self::Group {
                    operator: BooleanOperator::And,
                    operands,
                } => {
                    for operand in operands {
                        if !operand.evaluate(ctx).await? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                Self::Group {
                    operator: BooleanOperator::Or,
                    operands,
                } => {
                    for operand in operands {
                        if operand.evaluate(ctx).await? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
            }
        }
        .boxed()
    }
}
