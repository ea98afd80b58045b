//! The Shape Tree: resolved result shapes handed to emission.

use graphql_hir::{SchemaIndex, SchemaTypeRef, TypeRef, TYPENAME_FIELD};
use std::sync::Arc;

/// The result of resolving a selection set against one schema type, or one
/// type-condition branch of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionShape {
    /// The object, interface or union type the selection set was resolved
    /// against (unwrapped)
    pub base_type: SchemaTypeRef,
    /// Fields selected for every possible type, in first-occurrence order
    pub own_fields: Vec<FieldSelection>,
    /// Spreads kept as references instead of being inlined
    pub fragment_spreads: Vec<FragmentUse>,
    /// One entry per concrete type a type condition narrowed to, in order of
    /// first appearance
    pub inline_variants: Vec<TypeConditionalVariant>,
    /// True only for an operation's top-level shape
    pub is_root: bool,
}

impl SelectionShape {
    /// Look up an own field by output name.
    #[must_use]
    pub fn field(&self, output_name: &str) -> Option<&FieldSelection> {
        self.own_fields
            .iter()
            .find(|f| f.output_name.as_ref() == output_name)
    }

    /// The variant shape for a concrete type, if a type condition narrowed
    /// to it.
    #[must_use]
    pub fn variant(&self, type_name: &str) -> Option<&SelectionShape> {
        self.inline_variants
            .iter()
            .find(|v| v.type_name.as_ref() == type_name)
            .map(|v| v.shape.as_ref())
    }

    #[must_use]
    pub fn fragment_use(&self, name: &str) -> Option<&FragmentUse> {
        self.fragment_spreads
            .iter()
            .find(|u| u.name.as_ref() == name)
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.base_type.kind.is_abstract()
    }

    /// Possible types of an abstract shape that have no variant.
    ///
    /// Values of these types match only the base shape's own fields. Empty
    /// for object shapes.
    #[must_use]
    pub fn uncovered_types(&self, index: &SchemaIndex) -> Vec<Arc<str>> {
        if !self.is_abstract() {
            return Vec::new();
        }
        index
            .possible_types_of(self.base_type.name())
            .iter()
            .filter(|t| self.variant(t).is_none())
            .cloned()
            .collect()
    }

    /// True if `__typename` is among the own fields, explicit or synthesized.
    #[must_use]
    pub fn selects_typename(&self) -> bool {
        self.own_fields
            .iter()
            .any(|f| f.field_name.as_ref() == TYPENAME_FIELD)
    }

    /// A key that is equal for two shapes exactly when they are structurally
    /// equal: same output names in the same order, same leaf types, same
    /// list/non-null wrapping, same nested structure.
    ///
    /// The base type name only takes part when `__typename` is selected,
    /// since that is the only place it surfaces in the result.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        self.write_fingerprint(&mut out);
        out
    }

    fn write_fingerprint(&self, out: &mut String) {
        if self.selects_typename() {
            out.push_str(self.base_type.name());
        }
        out.push('{');
        for field in &self.own_fields {
            out.push_str(&field.output_name);
            out.push(':');
            match &field.nested {
                None => out.push_str(&field.ty.ty.to_string()),
                Some(nested) => {
                    write_wrapping(&field.ty.ty, out);
                    nested.write_fingerprint(out);
                }
            }
            if field.conditional {
                out.push('?');
            }
            if field.deferred {
                out.push('@');
            }
            out.push(',');
        }
        for fragment in &self.fragment_spreads {
            out.push_str("...");
            out.push_str(&fragment.name);
            out.push_str(match fragment.state {
                FragmentUseState::Combined => "+",
                FragmentUseState::Masked => "#",
            });
            if fragment.conditional {
                out.push('?');
            }
            if fragment.deferred {
                out.push('@');
            }
            out.push(',');
        }
        for variant in &self.inline_variants {
            out.push_str("on ");
            out.push_str(&variant.type_name);
            variant.shape.write_fingerprint(out);
            out.push(',');
        }
        out.push('}');
    }
}

/// One token per list level and one for the named type, so every wrapping
/// has a distinct encoding.
fn write_wrapping(ty: &TypeRef, out: &mut String) {
    for non_null in &ty.list_non_null {
        out.push_str(if *non_null { "[!" } else { "[?" });
    }
    out.push(if ty.is_non_null { '!' } else { '?' });
}

/// One resolved field of a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    /// Schema field name
    pub field_name: Arc<str>,
    /// Alias, or the field name when unaliased
    pub output_name: Arc<str>,
    /// Named type of the value plus the wrappers peeled off to reach it
    pub ty: SchemaTypeRef,
    /// Present exactly when the value type is an object, interface or union
    pub nested: Option<Arc<SelectionShape>>,
    /// Every occurrence carried `@skip`/`@include`
    pub conditional: bool,
    /// Every occurrence was under `@defer`
    pub deferred: bool,
    /// Added by typename synthesis rather than selected
    pub synthesized: bool,
}

impl FieldSelection {
    /// Number of list levels around the value.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.ty.dimensions()
    }

    /// Non-null flag of each list level (outermost first), then of the
    /// named type.
    #[must_use]
    pub fn nullability(&self) -> (&[bool], bool) {
        (&self.ty.ty.list_non_null, self.ty.ty.is_non_null)
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.ty.is_leaf()
    }
}

/// A concrete type's branch of an abstract shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConditionalVariant {
    pub type_name: Arc<str>,
    pub shape: Arc<SelectionShape>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentUseState {
    /// The fragment's named shape is combined with the spreading shape
    Combined,
    /// Only an opaque reference to the fragment's data is exposed
    Masked,
}

/// A spread kept as a reference to a registered fragment.
///
/// The fragment's own shape is looked up by name through the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentUse {
    pub name: Arc<str>,
    /// The type the fragment is declared on
    pub type_condition: Arc<str>,
    pub state: FragmentUseState,
    pub conditional: bool,
    pub deferred: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_hir::TypeDefKind;

    fn object(name: &str) -> SchemaTypeRef {
        SchemaTypeRef {
            kind: TypeDefKind::Object,
            ty: TypeRef::named(name, false),
        }
    }

    fn leaf(output: &str, ty: TypeRef) -> FieldSelection {
        FieldSelection {
            field_name: Arc::from(output),
            output_name: Arc::from(output),
            ty: SchemaTypeRef {
                kind: TypeDefKind::Scalar,
                ty,
            },
            nested: None,
            conditional: false,
            deferred: false,
            synthesized: false,
        }
    }

    fn shape(base: &str, own_fields: Vec<FieldSelection>) -> SelectionShape {
        SelectionShape {
            base_type: object(base),
            own_fields,
            fragment_spreads: Vec::new(),
            inline_variants: Vec::new(),
            is_root: false,
        }
    }

    #[test]
    fn test_fingerprint_ignores_base_type_without_typename() {
        let user = shape("User", vec![leaf("id", TypeRef::named("ID", true))]);
        let repo = shape("Repo", vec![leaf("id", TypeRef::named("ID", true))]);
        assert_eq!(user.fingerprint(), repo.fingerprint());

        let typename = || leaf("__typename", TypeRef::named("String", true));
        let user = shape("User", vec![typename()]);
        let repo = shape("Repo", vec![typename()]);
        assert_ne!(user.fingerprint(), repo.fingerprint());
    }

    #[test]
    fn test_fingerprint_distinguishes_nullability_and_order() {
        let non_null = shape("User", vec![leaf("id", TypeRef::named("ID", true))]);
        let nullable = shape("User", vec![leaf("id", TypeRef::named("ID", false))]);
        assert_ne!(non_null.fingerprint(), nullable.fingerprint());

        let ab = shape(
            "User",
            vec![
                leaf("a", TypeRef::named("Int", false)),
                leaf("b", TypeRef::named("Int", false)),
            ],
        );
        let ba = shape(
            "User",
            vec![
                leaf("b", TypeRef::named("Int", false)),
                leaf("a", TypeRef::named("Int", false)),
            ],
        );
        assert_ne!(ab.fingerprint(), ba.fingerprint());
    }

    #[test]
    fn test_fingerprint_distinguishes_list_wrapping_of_nested() {
        let inner = Arc::new(shape("User", vec![leaf("id", TypeRef::named("ID", true))]));
        let nested = |list_non_null: Vec<bool>, is_non_null: bool| FieldSelection {
            field_name: Arc::from("friends"),
            output_name: Arc::from("friends"),
            ty: SchemaTypeRef {
                kind: TypeDefKind::Object,
                ty: TypeRef {
                    name: Arc::from("User"),
                    list_non_null,
                    is_non_null,
                },
            },
            nested: Some(inner.clone()),
            conditional: false,
            deferred: false,
            synthesized: false,
        };
        let single = shape("Query", vec![nested(vec![], false)]);
        let list = shape("Query", vec![nested(vec![false], false)]);
        let non_null_list = shape("Query", vec![nested(vec![true], false)]);
        assert_ne!(single.fingerprint(), list.fingerprint());
        assert_ne!(list.fingerprint(), non_null_list.fingerprint());

        // [User]! against [User!]
        let non_null_list_of_nullable = shape("Query", vec![nested(vec![true], false)]);
        let nullable_list_of_non_null = shape("Query", vec![nested(vec![false], true)]);
        assert_ne!(
            non_null_list_of_nullable.fingerprint(),
            nullable_list_of_non_null.fingerprint()
        );
    }

    #[test]
    fn test_lookups() {
        let mut base = shape("Query", vec![leaf("id", TypeRef::named("ID", true))]);
        base.fragment_spreads.push(FragmentUse {
            name: Arc::from("F"),
            type_condition: Arc::from("Query"),
            state: FragmentUseState::Masked,
            conditional: false,
            deferred: false,
        });
        assert!(base.field("id").is_some());
        assert!(base.field("name").is_none());
        assert_eq!(
            base.fragment_use("F").map(|u| u.state),
            Some(FragmentUseState::Masked)
        );
        assert!(base.variant("User").is_none());
        assert!(!base.selects_typename());
    }
}
