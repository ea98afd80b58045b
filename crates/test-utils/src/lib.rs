//! # GraphQL Test Utilities
//!
//! Shared test infrastructure for the selection resolution crates: schema
//! fixtures, run builders and plain-text renderings for snapshots.

// Test utilities are less strict than production code
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::needless_raw_string_hashes)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! ## Quick Start
//!
//! ```ignore
//! use graphql_test_utils::{test_run, render_shape, fixtures::GITHUNT_SCHEMA};
//!
//! #[test]
//! fn test_current_user() {
//!     let run = test_run(GITHUNT_SCHEMA, "query Me { currentUser { login } }");
//!     insta::assert_snapshot!(render_shape(&run.operation("Me").unwrap().shape));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`project`] - Helpers and a builder for resolution runs
//! - [`render`] - Shape and name table renderings
//! - [`assertions`] - Error formatting
//! - [`fixtures`] - Common schemas and documents

pub mod assertions;
pub mod fixtures;
pub mod project;
pub mod render;

pub use assertions::{error_kinds, format_errors};
pub use project::{
    test_document, test_run, test_run_with_config, test_schema_index, TestRunBuilder,
};
pub use render::{render_name_table, render_shape};

// Re-export insta for snapshot testing
pub use insta;

/// Install a test subscriber honouring `RUST_LOG`. Safe to call from every
/// test; only the first call installs it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_test_writer()
        .try_init();
}
