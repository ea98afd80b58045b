//! Plain-text renderings of shapes and name tables for snapshot tests.
//!
//! ```text
//! Entry {
//!   id: Int!
//!   repository: Repository! {
//!     full_name: String!
//!   }
//!   ...FeedEntry [combined]
//! }
//! ```

use graphql_selection::{FragmentUseState, NameTable, SelectionShape};
use std::fmt::Write;

/// Render a shape tree, one field per line.
///
/// Markers: `[conditional]`, `[deferred]` and `[synthesized]` on fields,
/// `[combined]` or `[masked]` on kept fragment spreads. Variants are
/// rendered as `on Type { ... }` after the own fields.
pub fn render_shape(shape: &SelectionShape) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} ", shape.base_type.name());
    write_body(shape, 0, &mut out);
    out
}

fn write_body(shape: &SelectionShape, depth: usize, out: &mut String) {
    out.push_str("{\n");
    let indent = "  ".repeat(depth + 1);
    for field in &shape.own_fields {
        let _ = write!(out, "{indent}{}: {}", field.output_name, field.ty.ty);
        if field.output_name != field.field_name {
            let _ = write!(out, " (alias of {})", field.field_name);
        }
        if field.conditional {
            out.push_str(" [conditional]");
        }
        if field.deferred {
            out.push_str(" [deferred]");
        }
        if field.synthesized {
            out.push_str(" [synthesized]");
        }
        if let Some(nested) = &field.nested {
            out.push(' ');
            write_body(nested, depth + 1, out);
        }
        out.push('\n');
    }
    for fragment in &shape.fragment_spreads {
        let state = match fragment.state {
            FragmentUseState::Combined => "combined",
            FragmentUseState::Masked => "masked",
        };
        let _ = write!(out, "{indent}...{} [{state}]", fragment.name);
        if fragment.conditional {
            out.push_str(" [conditional]");
        }
        if fragment.deferred {
            out.push_str(" [deferred]");
        }
        out.push('\n');
    }
    for variant in &shape.inline_variants {
        let _ = write!(out, "{indent}on {} ", variant.type_name);
        write_body(&variant.shape, depth + 1, out);
        out.push('\n');
    }
    out.push_str(&"  ".repeat(depth));
    out.push('}');
}

/// Render every entry of a name table as `path => Name`, with `(reused)`
/// on names shared with an earlier identical shape.
pub fn render_name_table(names: &NameTable) -> String {
    names
        .entries()
        .iter()
        .map(|entry| {
            let reused = if entry.deduplicated { " (reused)" } else { "" };
            format!("{} => {}{reused}", entry.path, entry.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
