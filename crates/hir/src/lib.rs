// GraphQL HIR (High-level Intermediate Representation)
// This crate provides semantic views on top of syntax: the schema type index
// and the executable definitions of each document.

mod schema_index;
mod structure;

pub use schema_index::*;
pub use structure::*;
