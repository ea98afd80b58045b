//! File-related types: [`FileId`], [`FileUri`], [`DocumentOrigin`].

use std::sync::Arc;

/// Input file identifier within a generation run.
///
/// A simple u32-based ID assigned in the order documents are handed to the
/// run. Definitions resolved from the same document share a `FileId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    /// Create a new `FileId` from a raw u32 value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value of this `FileId`.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// A URI string identifying a file.
///
/// This is typically a path or `file://` URI for documents on disk, or a
/// virtual name (e.g. `external://UserFields`) for fragments supplied through
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileUri(Arc<str>);

impl FileUri {
    /// Create a new `FileUri` from a string.
    #[must_use]
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self(uri.into())
    }

    /// Get the URI as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a document's definitions come from.
///
/// Local documents produce generated output for every operation and fragment
/// they define. External documents only contribute fragment definitions that
/// local documents may spread (cross-file fragment composition); nothing is
/// generated for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentOrigin {
    /// Part of the generation unit
    #[default]
    Local,
    /// Visible for fragment resolution only
    External,
}

impl DocumentOrigin {
    /// Returns `true` if this document is part of the generation unit.
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }

    /// Returns `true` if this document only provides fragments.
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::External)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id() {
        let file_id = FileId::new(42);
        assert_eq!(file_id.as_u32(), 42);
        assert!(FileId::new(1) < FileId::new(2));
    }

    #[test]
    fn test_file_uri() {
        let uri = FileUri::new("file:///path/to/file.graphql");
        assert_eq!(uri.as_str(), "file:///path/to/file.graphql");
        assert_eq!(uri.to_string(), "file:///path/to/file.graphql");
    }

    #[test]
    fn test_document_origin() {
        assert!(DocumentOrigin::Local.is_local());
        assert!(!DocumentOrigin::Local.is_external());
        assert!(DocumentOrigin::External.is_external());
        assert_eq!(DocumentOrigin::default(), DocumentOrigin::Local);
    }
}
