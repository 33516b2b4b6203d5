pub mod binding;
pub mod convert;
pub mod descriptor;
pub mod reconcile;
pub mod registry;
pub mod tree;
pub mod validate;
pub mod value;
#[cfg(test)]
mod testutil;

/// Submission payload: maps parameter names to a list of values (simple parameters), a list
/// wrapping a list of values (array-typed simple parameters), or a list of nested payloads (group
/// parameters).
pub type Payload = serde_json::Map<String, serde_json::Value>;

pub use tree::{ParamId, Parameter, ParameterTree};
pub use value::Value;
