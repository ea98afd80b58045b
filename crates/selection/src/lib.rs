//! # graphql-selection
//!
//! Resolves GraphQL selection sets into result shapes: the structure a code
//! generator renders into types.
//!
//! ## Architecture
//!
//! ```text
//! documents ──► FragmentRegistry (one per run)
//!                    │
//! operation ──► SelectionWalker ──► raw selection set
//!                                        │
//!                                Resolver: expand spreads,
//!                                merge fields, split variants
//!                                        │
//!                                  SelectionShape tree
//!                                        │
//!                                ShapeNamer ──► NameTable
//! ```
//!
//! - The walker validates every field, sub-selection and type condition
//!   against the [`graphql_hir::SchemaIndex`]. Type conditions do not nest;
//!   they narrow the set of possible types the selections beneath them
//!   apply to.
//! - The resolver inlines spreads, keeps them as combined references, or
//!   masks them, depending on `fragmentMode`. With `flattenFragments` the
//!   walker inlines them itself; both routes produce the same shapes.
//! - Fragment bodies are walked at most once per run and cached in the
//!   registry. Failures are never cached.
//! - Every local operation and fragment resolves independently; an error in
//!   one is reported in its [`DefinitionOutcome`] and never affects another.
//!
//! ```rust,ignore
//! let run = resolve_documents(&schema, &documents, &[], &config);
//! for outcome in run.outcomes() {
//!     match outcome {
//!         DefinitionOutcome::Resolved(resolved) => emit(&resolved.shape, run.names()),
//!         DefinitionOutcome::Failed { definition, error } => report(definition, error),
//!     }
//! }
//! ```

mod error;
mod namer;
mod raw;
mod registry;
mod resolver;
mod run;
mod shape;
mod walker;

pub use error::{DefinitionKind, DefinitionRef, ResolutionError, ResponsePath, Result};
pub use namer::{
    convert_name, name_shapes, NameTable, NamedShapeEntry, NamerRoot, PathSegment, RootKind,
    ShapePath,
};
pub use registry::{FragmentDefinition, FragmentRegistry, Registration};
pub use resolver::Resolver;
pub use run::{resolve_documents, DefinitionOutcome, ResolvedDefinition, ResolvedRun};
pub use shape::{
    FieldSelection, FragmentUse, FragmentUseState, SelectionShape, TypeConditionalVariant,
};
