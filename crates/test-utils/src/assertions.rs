//! Snapshot helpers for resolution errors.
//!
//! Errors are formatted consistently so snapshots stay readable.

use graphql_selection::{ResolutionError, ResolvedRun};

/// Format errors as numbered lines of `Kind: message`.
///
/// # Example
///
/// ```ignore
/// use graphql_test_utils::assertions::format_errors;
///
/// let run = test_run(SCHEMA, "query { nope }");
/// insta::assert_snapshot!(format_errors(&run.errors()));
/// ```
pub fn format_errors(errors: &[&ResolutionError]) -> String {
    if errors.is_empty() {
        return String::from("(no errors)");
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("[{}] {}: {e}", i + 1, e.kind()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Error kinds of a run, in reporting order. Useful when positions and
/// wording don't matter.
pub fn error_kinds(run: &ResolvedRun) -> Vec<&'static str> {
    run.errors().iter().map(|e| e.kind()).collect()
}

/// Format plain messages as numbered lines.
pub fn format_messages<T: AsRef<str>>(messages: &[T]) -> String {
    if messages.is_empty() {
        return String::from("(no errors)");
    }

    messages
        .iter()
        .enumerate()
        .map(|(i, m)| format!("[{}] {}", i + 1, m.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::GITHUNT_SCHEMA;
    use crate::test_run;

    #[test]
    fn test_format_errors_empty() {
        assert_eq!(format_errors(&[]), "(no errors)");
    }

    #[test]
    fn test_format_errors_single() {
        let run = test_run(GITHUNT_SCHEMA, "query Me { currentUser { nope } }");
        let formatted = format_errors(&run.errors());
        assert!(formatted.starts_with("[1] UnknownField: file:///query.graphql:1:"));
        assert!(formatted.contains("Cannot query field \"nope\" on type \"User\""));
        assert!(formatted.contains("(at Me.currentUser.nope)"));
    }

    #[test]
    fn test_format_messages() {
        let messages = vec!["Error 1", "Error 2"];
        assert_eq!(format_messages(&messages), "[1] Error 1\n[2] Error 2");
    }
}
