//! Test run builders and helpers.
//!
//! Use the simple functions for a schema plus one document, and the builder
//! for multi-file scenarios, external fragments or a custom config.

use graphql_codegen_config::CodegenConfig;
use graphql_hir::SchemaIndex;
use graphql_selection::{resolve_documents, ResolvedRun};
use graphql_syntax::{parse_document, parse_schema, SourceDocument};
use graphql_types::{DocumentOrigin, FileUri};

/// Resolve one document against a schema with the default config.
///
/// # Example
///
/// ```ignore
/// use graphql_test_utils::{test_run, fixtures::GITHUNT_SCHEMA};
///
/// let run = test_run(GITHUNT_SCHEMA, "query Me { currentUser { login } }");
/// assert!(run.operation("Me").is_some());
/// ```
pub fn test_run(schema: &str, document: &str) -> ResolvedRun {
    TestRunBuilder::new(schema)
        .with_document("query.graphql", document)
        .build()
}

/// Resolve one document against a schema with a custom config.
pub fn test_run_with_config(schema: &str, document: &str, config: CodegenConfig) -> ResolvedRun {
    TestRunBuilder::new(schema)
        .with_document("query.graphql", document)
        .with_config(config)
        .build()
}

/// Build the schema index for an SDL string.
///
/// Panics if the schema doesn't validate; fixtures are expected to be valid.
pub fn test_schema_index(schema: &str) -> SchemaIndex {
    let uri = FileUri::new("file:///schema.graphql");
    let schema =
        parse_schema(schema, &uri).unwrap_or_else(|e| panic!("test schema is invalid: {e}"));
    SchemaIndex::new(&schema)
}

/// Parse a local document named like `query.graphql`.
pub fn test_document(name: &str, content: &str) -> SourceDocument {
    parse_document(
        content,
        FileUri::new(format!("file:///{name}")),
        DocumentOrigin::Local,
    )
}

/// Builder for runs with several documents.
///
/// # Example
///
/// ```ignore
/// use graphql_test_utils::TestRunBuilder;
///
/// let run = TestRunBuilder::new(SCHEMA)
///     .with_document("fragments.graphql", "fragment UserFields on User { id }")
///     .with_document("queries.graphql", "query Q { user { ...UserFields } }")
///     .build();
/// ```
pub struct TestRunBuilder {
    schema: String,
    documents: Vec<(String, String)>,
    externals: Vec<(String, String)>,
    config: CodegenConfig,
}

impl TestRunBuilder {
    pub fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            documents: Vec::new(),
            externals: Vec::new(),
            config: CodegenConfig::default(),
        }
    }

    /// Add a local document. The name becomes a `file:///` URI.
    pub fn with_document(mut self, name: &str, content: &str) -> Self {
        self.documents.push((name.to_string(), content.to_string()));
        self
    }

    /// Add a document that only contributes fragment definitions.
    pub fn with_external(mut self, name: &str, content: &str) -> Self {
        self.externals.push((name.to_string(), content.to_string()));
        self
    }

    pub fn with_config(mut self, config: CodegenConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse everything and resolve the run.
    pub fn build(self) -> ResolvedRun {
        let uri = FileUri::new("file:///schema.graphql");
        let schema = parse_schema(&self.schema, &uri)
            .unwrap_or_else(|e| panic!("test schema is invalid: {e}"));

        let documents: Vec<SourceDocument> = self
            .documents
            .iter()
            .map(|(name, content)| test_document(name, content))
            .collect();
        let externals: Vec<SourceDocument> = self
            .externals
            .iter()
            .map(|(name, content)| {
                parse_document(
                    content,
                    FileUri::new(format!("file:///{name}")),
                    DocumentOrigin::External,
                )
            })
            .collect();

        resolve_documents(&schema, &documents, &externals, &self.config)
    }
}
