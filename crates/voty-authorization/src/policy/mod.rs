//! Policy trees bound to the function registry, and their evaluator

mod boolean;
mod evaluator;
mod weight;

pub use boolean::CompiledPolicy;
pub use evaluator::PolicyEvaluator;
pub use weight::CompiledWeight;
