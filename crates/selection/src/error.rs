use graphql_hir::OperationType;
use graphql_types::{FileUri, SourceLocation};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolutionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Operation,
    Fragment,
}

/// Identifies the operation or fragment a resolution belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionRef {
    pub kind: DefinitionKind,
    /// `None` for anonymous operations
    pub name: Option<Arc<str>>,
    pub uri: FileUri,
}

impl DefinitionRef {
    #[must_use]
    pub fn operation(name: Option<Arc<str>>, uri: FileUri) -> Self {
        Self {
            kind: DefinitionKind::Operation,
            name,
            uri,
        }
    }

    #[must_use]
    pub fn fragment(name: Arc<str>, uri: FileUri) -> Self {
        Self {
            kind: DefinitionKind::Fragment,
            name: Some(name),
            uri,
        }
    }

    /// The definition name, or `"<anonymous>"`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

impl fmt::Display for DefinitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.name) {
            (DefinitionKind::Operation, Some(name)) => write!(f, "operation \"{name}\""),
            (DefinitionKind::Operation, None) => f.write_str("anonymous operation"),
            (DefinitionKind::Fragment, name) => {
                write!(f, "fragment \"{}\"", name.as_deref().unwrap_or_default())
            }
        }
    }
}

/// Response path of a selection, starting at the definition name
/// (`Feed.feed.repository`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResponsePath(Vec<Arc<str>>);

impl ResponsePath {
    #[must_use]
    pub fn root(name: impl Into<Arc<str>>) -> Self {
        Self(vec![name.into()])
    }

    #[must_use]
    pub fn child(&self, segment: impl Into<Arc<str>>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[Arc<str>] {
        &self.0
    }
}

impl fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

struct CycleDisplay<'a>(&'a [Arc<str>]);

impl fmt::Display for CycleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// A semantic error that stops one definition from resolving.
///
/// Every variant carries the location of the offending node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("{location}: Cannot query field \"{field}\" on type \"{type_name}\" (at {path})")]
    UnknownField {
        field: Arc<str>,
        type_name: Arc<str>,
        path: ResponsePath,
        location: SourceLocation,
    },

    #[error(
        "{location}: Fields \"{output_name}\" conflict because {existing} and {conflicting} are different fields (at {path})"
    )]
    ConflictingAlias {
        output_name: Arc<str>,
        /// `field: Type` of the first occurrence
        existing: String,
        /// `field: Type` of the conflicting occurrence
        conflicting: String,
        path: ResponsePath,
        location: SourceLocation,
    },

    #[error("{location}: Unknown fragment \"{name}\" spread in {referenced_by}")]
    MissingFragment {
        name: Arc<str>,
        referenced_by: DefinitionRef,
        location: SourceLocation,
    },

    #[error("{location}: Fragment cycle detected: {}", CycleDisplay(.cycle))]
    CyclicFragment {
        /// Fragment names, starting and ending with the same fragment
        cycle: Vec<Arc<str>>,
        location: SourceLocation,
    },

    #[error(
        "{location}: Fragment cannot be spread here as objects of type \"{parent_type}\" can never be of type \"{type_condition}\" (at {path})"
    )]
    InvalidTypeCondition {
        type_condition: Arc<str>,
        parent_type: Arc<str>,
        path: ResponsePath,
        location: SourceLocation,
    },

    #[error("{location}: There can be only one fragment named \"{name}\" (first defined in {existing})")]
    DuplicateFragmentName {
        name: Arc<str>,
        existing: FileUri,
        location: SourceLocation,
    },

    #[error("{location}: Unknown type \"{name}\"")]
    UnknownType {
        name: Arc<str>,
        location: SourceLocation,
    },

    #[error(
        "{location}: Field \"{field}\" must not have a selection since type \"{type_name}\" has no subfields (at {path})"
    )]
    UnexpectedSubselection {
        field: Arc<str>,
        type_name: Arc<str>,
        path: ResponsePath,
        location: SourceLocation,
    },

    #[error(
        "{location}: Field \"{field}\" of type \"{type_name}\" must have a selection of subfields (at {path})"
    )]
    MissingSubselection {
        field: Arc<str>,
        type_name: Arc<str>,
        path: ResponsePath,
        location: SourceLocation,
    },

    #[error("{location}: Selection nesting exceeds the maximum depth of {limit} (at {path})")]
    DepthLimitExceeded {
        limit: usize,
        path: ResponsePath,
        location: SourceLocation,
    },

    #[error("{location}: Schema has no root type for {operation_type:?} operations ({definition})")]
    MissingRootType {
        operation_type: OperationType,
        definition: DefinitionRef,
        location: SourceLocation,
    },
}

impl ResolutionError {
    /// Where in the documents the error was detected.
    #[must_use]
    pub const fn location(&self) -> &SourceLocation {
        match self {
            Self::UnknownField { location, .. }
            | Self::ConflictingAlias { location, .. }
            | Self::MissingFragment { location, .. }
            | Self::CyclicFragment { location, .. }
            | Self::InvalidTypeCondition { location, .. }
            | Self::DuplicateFragmentName { location, .. }
            | Self::UnknownType { location, .. }
            | Self::UnexpectedSubselection { location, .. }
            | Self::MissingSubselection { location, .. }
            | Self::DepthLimitExceeded { location, .. }
            | Self::MissingRootType { location, .. } => location,
        }
    }

    /// Stable kind name, for diagnostics and snapshots.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => "UnknownField",
            Self::ConflictingAlias { .. } => "ConflictingAlias",
            Self::MissingFragment { .. } => "MissingFragment",
            Self::CyclicFragment { .. } => "CyclicFragment",
            Self::InvalidTypeCondition { .. } => "InvalidTypeCondition",
            Self::DuplicateFragmentName { .. } => "DuplicateFragmentName",
            Self::UnknownType { .. } => "UnknownType",
            Self::UnexpectedSubselection { .. } => "UnexpectedSubselection",
            Self::MissingSubselection { .. } => "MissingSubselection",
            Self::DepthLimitExceeded { .. } => "DepthLimitExceeded",
            Self::MissingRootType { .. } => "MissingRootType",
        }
    }
}
