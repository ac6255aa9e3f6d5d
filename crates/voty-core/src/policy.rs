//! Policy and weight trees as authored by communities
//!
//! Both trees are recursive: a node is either a group combining its operands
//! or a call to a named function from the function registry. Authoring tools
//! usually produce one OR of ANDs, but any depth is valid.
//!
//! ```json
//! { "operator": "or", "operands": [
//!     { "operator": "and", "operands": [
//!         { "function": "exact_did", "arguments": [["alice.bit"]] }
//!     ] }
//! ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Call of a registered function with already-typed arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Registered function name
    pub function: String,
    /// Positional arguments
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl FunctionCall {
    /// Create a call of `function` with `arguments`
    pub fn new(function: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            function: function.into(),
            arguments,
        }
    }
}

/// Boolean combinator of a policy group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOperator {
    /// All operands must hold; vacuously true when empty
    And,
    /// At least one operand must hold; vacuously false when empty
    Or,
}

/// Group node of a policy tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyGroup {
    /// Display name given by the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// How operands are combined
    pub operator: BooleanOperator,
    /// Owned operand list
    pub operands: Vec<PolicyNode>,
}

/// Node of a yes/no permission tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyNode {
    /// Combination of sub-policies
    Group(PolicyGroup),
    /// Leaf calling a boolean function
    Predicate(FunctionCall),
}

impl PolicyNode {
    /// Conjunction of `operands`
    pub fn and(operands: Vec<PolicyNode>) -> Self {
        Self::Group(PolicyGroup {
            name: None,
            operator: BooleanOperator::And,
            operands,
        })
    }

    /// Disjunction of `operands`
    pub fn or(operands: Vec<PolicyNode>) -> Self {
        Self::Group(PolicyGroup {
            name: None,
            operator: BooleanOperator::Or,
            operands,
        })
    }

    /// Leaf calling `function`
    pub fn predicate(function: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self::Predicate(FunctionCall::new(function, arguments))
    }

    /// All leaves in depth-first order
    pub fn leaves(&self) -> Vec<&FunctionCall> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FunctionCall>) {
        match self {
            Self::Predicate(call) => out.push(call),
            Self::Group(group) => {
                for operand in &group.operands {
                    operand.collect_leaves(out);
                }
            }
        }
    }
}

/// Numeric combinator of a weight group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightOperator {
    /// Sum of operands: distinct criteria contribute additively
    #[serde(alias = "and")]
    Sum,
    /// Maximum of operands: best alternative, never double counted
    #[serde(alias = "or")]
    Max,
}

/// Group node of a weight tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGroup {
    /// Display name given by the author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// How operand weights are folded
    pub operator: WeightOperator,
    /// Owned operand list
    pub operands: Vec<WeightNode>,
}

/// Node of a voting-power tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightNode {
    /// Combination of sub-weights
    Group(WeightGroup),
    /// Leaf calling a weight function
    Leaf(FunctionCall),
}

impl WeightNode {
    /// Sum of `operands`
    pub fn sum(operands: Vec<WeightNode>) -> Self {
        Self::Group(WeightGroup {
            name: None,
            operator: WeightOperator::Sum,
            operands,
        })
    }

    /// Maximum of `operands`
    pub fn max(operands: Vec<WeightNode>) -> Self {
        Self::Group(WeightGroup {
            name: None,
            operator: WeightOperator::Max,
            operands,
        })
    }

    /// Leaf calling `function`
    pub fn leaf(function: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self::Leaf(FunctionCall::new(function, arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_or_of_ands() {
        let node: PolicyNode = serde_json::from_value(json!({
            "operator": "or",
            "operands": [{
                "name": "members",
                "operator": "and",
                "operands": [
                    { "function": "exact_did", "arguments": [["alice.bit"]] }
                ]
            }]
        }))
        .unwrap();

        let leaves = node.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].function, "exact_did");
        match node {
            PolicyNode::Group(group) => assert_eq!(group.operator, BooleanOperator::Or),
            PolicyNode::Predicate(_) => panic!("expected group"),
        }
    }

    #[test]
    fn test_weight_operator_aliases() {
        let sum: WeightOperator = serde_json::from_value(json!("and")).unwrap();
        let max: WeightOperator = serde_json::from_value(json!("or")).unwrap();
        assert_eq!(sum, WeightOperator::Sum);
        assert_eq!(max, WeightOperator::Max);
        assert_eq!(serde_json::to_value(WeightOperator::Sum).unwrap(), json!("sum"));
    }

    #[test]
    fn test_malformed_node_is_rejected() {
        let result =
            serde_json::from_value::<PolicyNode>(json!({ "operator": "xor", "operands": [] }));
        assert!(result.is_err());
        let result = serde_json::from_value::<PolicyNode>(json!({ "arguments": [] }));
        assert!(result.is_err());
    }
}
