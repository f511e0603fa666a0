//! The occlusion policy: eligibility rules, the occlusion relation, the
//! bookkeeping stacks and the engine that combines them.

pub mod eligibility;
pub mod engine;
pub mod occlusion;
pub mod stack;

pub use engine::{Evaluation, PolicyEngine};
pub use occlusion::{entangled, occludes};
pub use stack::RecencyStack;
