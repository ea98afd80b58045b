//! # GraphQL Syntax Parsing
//!
//! This crate parses the two inputs of a resolution run:
//!
//! - **Schema SDL**, parsed and validated by apollo-compiler into a
//!   `Valid<Schema>` (built-in scalars and introspection types included).
//! - **Executable documents** (operations and fragments). Syntax errors come
//!   from apollo-parser, which reports precise byte offsets; the AST used for
//!   resolution comes from apollo-compiler. A document with syntax errors still
//!   yields the partial AST so unaffected definitions can be resolved.
//!
//! ```rust,ignore
//! let schema = parse_schema(sdl, &FileUri::new("schema.graphql"))?;
//! let doc = parse_document(source, FileUri::new("feed.graphql"), DocumentOrigin::Local);
//! for def in &doc.ast().definitions { /* ... */ }
//! ```

use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use graphql_types::{DocumentOrigin, FileUri, OffsetRange, Position, SourceLocation};
use std::sync::Arc;
use thiserror::Error;

/// A parse error with position information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {offset})")]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Byte offset where the error occurred
    pub offset: usize,
}

/// The schema could not be parsed or failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaLoadError {
    #[error("Schema {uri} is invalid:\n{}", .messages.join("\n"))]
    Invalid { uri: FileUri, messages: Vec<String> },

    #[error("No schema sources were provided")]
    Empty,
}

/// A parsed executable document.
///
/// Cheap to clone; the source, AST and line index are shared.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    uri: FileUri,
    origin: DocumentOrigin,
    source: Arc<str>,
    ast: Arc<ast::Document>,
    line_index: Arc<LineIndex>,
    errors: Arc<[ParseError]>,
}

impl SourceDocument {
    #[must_use]
    pub const fn uri(&self) -> &FileUri {
        &self.uri
    }

    #[must_use]
    pub const fn origin(&self) -> DocumentOrigin {
        self.origin
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed AST (partial if the document has syntax errors).
    #[must_use]
    pub fn ast(&self) -> &ast::Document {
        &self.ast
    }

    #[must_use]
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Returns the parse errors.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Returns true if there were any parse errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Build a [`SourceLocation`] for a byte range in this document.
    #[must_use]
    pub fn location(&self, range: OffsetRange) -> SourceLocation {
        SourceLocation::new(self.uri.clone(), range, self.line_index.position(range.start))
    }
}

/// Parse an executable document.
#[tracing::instrument(skip(source), fields(uri = %uri, size = source.len()))]
pub fn parse_document(source: &str, uri: FileUri, origin: DocumentOrigin) -> SourceDocument {
    let tree = apollo_parser::Parser::new(source).parse();

    let mut errors: Vec<ParseError> = tree
        .errors()
        .map(|e| ParseError {
            message: e.message().to_string(),
            offset: e.index(),
        })
        .collect();

    let ast = match ast::Document::parse(source, uri.as_str()) {
        Ok(doc) => doc,
        Err(with_errors) => {
            // Syntax errors were already collected with offsets from the CST
            if errors.is_empty() {
                errors.extend(with_errors.errors.iter().map(|e| ParseError {
                    message: e.to_string(),
                    offset: 0,
                }));
            }
            with_errors.partial
        }
    };

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "Document has syntax errors");
    }

    SourceDocument {
        uri,
        origin,
        source: Arc::from(source),
        ast: Arc::new(ast),
        line_index: Arc::new(LineIndex::new(source)),
        errors: errors.into(),
    }
}

/// Parse and validate a schema from a single SDL source.
#[tracing::instrument(skip(sdl), fields(uri = %uri, size = sdl.len()))]
pub fn parse_schema(sdl: &str, uri: &FileUri) -> Result<Valid<Schema>, SchemaLoadError> {
    Schema::parse_and_validate(sdl, uri.as_str()).map_err(|with_errors| {
        SchemaLoadError::Invalid {
            uri: uri.clone(),
            messages: with_errors.errors.iter().map(|e| e.to_string()).collect(),
        }
    })
}

/// Parse and validate a schema split across several SDL sources.
///
/// Errors are attributed to the first source's URI.
#[tracing::instrument(skip(sources), fields(sources = sources.len()))]
pub fn parse_schema_sources(
    sources: &[(FileUri, &str)],
) -> Result<Valid<Schema>, SchemaLoadError> {
    let Some((first_uri, _)) = sources.first() else {
        return Err(SchemaLoadError::Empty);
    };

    let invalid = |messages: Vec<String>| SchemaLoadError::Invalid {
        uri: first_uri.clone(),
        messages,
    };

    let mut builder = Schema::builder();
    for (uri, sdl) in sources {
        builder = builder.parse(*sdl, uri.as_str());
    }
    let schema = builder
        .build()
        .map_err(|e| invalid(e.errors.iter().map(|d| d.to_string()).collect()))?;
    schema
        .validate()
        .map_err(|e| invalid(e.errors.iter().map(|d| d.to_string()).collect()))
}

/// Line index for a file (for position conversions)
/// Maps byte offsets to line/column positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Create a new line index from source text
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];

        for (i, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }

        Self { line_starts }
    }

    /// Convert a byte offset to a line/column position (0-based)
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1));

        let col = offset - self.line_starts[line];
        (line, col)
    }

    /// Convert a byte offset to a [`Position`]
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let (line, col) = self.line_col(offset);
        Position::new(line as u32, col as u32)
    }

    /// Get the byte offset of the start of a line
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Get the number of lines
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
