//! Constrained schema subset used to validate tool inputs.
//!
//! Tool input schemas are carried as typed [`SchemaNode`] trees rather than
//! raw JSON values; the same tree both validates arguments before dispatch
//! and serializes to the JSON-schema shape listed by the `tools` route.

mod node;
mod validator;

pub use node::SchemaNode;
pub use validator::{validate, IssueCode, ValidationIssue, ValidationReport};
