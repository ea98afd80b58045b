//! Raw selection sets: the walker's output before fragment expansion and
//! field merging.
//!
//! Every item records which of the scope's possible types it applies to.
//! Type conditions never create nesting here; they only narrow the
//! applicability of the items they contain, which is what lets a fragment
//! body walked once against its own type condition be replayed under any
//! spreading scope.

use crate::error::{DefinitionRef, ResponsePath};
use crate::shape::FragmentUseState;
use graphql_hir::{FieldDef, SchemaIndex};
use graphql_types::SourceLocation;
use std::sync::Arc;

/// The possible types of a scope an item applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Applicability {
    /// Every possible type of the scope
    All,
    /// A proper subset, in the scope's possible-types order. May be empty.
    Only(Vec<Arc<str>>),
}

impl Applicability {
    /// The covered types, given the scope's possible types.
    pub(crate) fn types<'a>(&'a self, possible: &'a [Arc<str>]) -> &'a [Arc<str>] {
        match self {
            Self::All => possible,
            Self::Only(types) => types,
        }
    }

    pub(crate) fn includes(&self, type_name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(types) => types.iter().any(|t| t.as_ref() == type_name),
        }
    }

    /// Restrict to the types in `condition`.
    pub(crate) fn narrow(&self, condition: &[Arc<str>], possible: &[Arc<str>]) -> Self {
        let narrowed: Vec<Arc<str>> = self
            .types(possible)
            .iter()
            .filter(|t| condition.contains(t))
            .cloned()
            .collect();
        Self::from_types(narrowed, possible)
    }

    fn from_types(types: Vec<Arc<str>>, possible: &[Arc<str>]) -> Self {
        if types.len() == possible.len() {
            Self::All
        } else {
            Self::Only(types)
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawSelectionSet {
    /// The type the items' applicability is relative to
    pub(crate) scope: Arc<str>,
    pub(crate) items: Vec<RawItem>,
}

#[derive(Debug, Clone)]
pub(crate) enum RawItem {
    Field(RawField),
    Spread(RawSpread),
    /// A type condition narrowed to these types at this position. Produces a
    /// variant even when nothing is selected under the condition.
    Narrow(Vec<Arc<str>>),
    /// A spread the resolver kept as a reference
    Use(RawUse),
}

impl RawItem {
    pub(crate) fn applies_to(&self) -> Option<&Applicability> {
        match self {
            Self::Field(field) => Some(&field.applies_to),
            Self::Spread(spread) => Some(&spread.applies_to),
            Self::Use(fragment) => Some(&fragment.applies_to),
            Self::Narrow(_) => None,
        }
    }

    /// Types this item narrows to, if any.
    pub(crate) fn narrowed_types(&self) -> &[Arc<str>] {
        match self {
            Self::Narrow(types) => types,
            other => match other.applies_to() {
                Some(Applicability::Only(types)) => types,
                _ => &[],
            },
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawField {
    pub(crate) applies_to: Applicability,
    /// The type the field was looked up on: the innermost type condition, or
    /// the scope
    pub(crate) lookup_type: Arc<str>,
    pub(crate) field: FieldDef,
    pub(crate) output_name: Arc<str>,
    pub(crate) nested: Option<Arc<RawSelectionSet>>,
    pub(crate) conditional: bool,
    pub(crate) deferred: bool,
    pub(crate) location: SourceLocation,
    pub(crate) path: ResponsePath,
}

#[derive(Debug, Clone)]
pub(crate) struct RawSpread {
    pub(crate) applies_to: Applicability,
    pub(crate) name: Arc<str>,
    pub(crate) conditional: bool,
    pub(crate) deferred: bool,
    pub(crate) unmask: bool,
    pub(crate) location: SourceLocation,
    /// The definition whose body contains the spread
    pub(crate) referenced_by: DefinitionRef,
}

#[derive(Debug, Clone)]
pub(crate) struct RawUse {
    pub(crate) applies_to: Applicability,
    pub(crate) name: Arc<str>,
    pub(crate) type_condition: Arc<str>,
    pub(crate) state: FragmentUseState,
    pub(crate) conditional: bool,
    pub(crate) deferred: bool,
}

/// Flags a spread passes down to the items it contributes.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Inherited {
    pub(crate) conditional: bool,
    pub(crate) deferred: bool,
}

/// Re-express the items of `raw` relative to `target`, keeping only what
/// applies within `within` (itself relative to `target`).
///
/// An item ends up applying to the target's possible types that are both in
/// `within` and covered by the item's original applicability. Items that
/// apply to nothing are dropped, as are narrowing events that no longer
/// narrow.
pub(crate) fn project(
    raw: &RawSelectionSet,
    target: &str,
    within: &Applicability,
    inherited: Inherited,
    index: &SchemaIndex,
) -> Vec<RawItem> {
    let source_possible = index.possible_types_of(&raw.scope);
    let target_possible = index.possible_types_of(target);
    let within = within.types(target_possible);

    let intersect = |types: &[Arc<str>]| -> Vec<Arc<str>> {
        within
            .iter()
            .filter(|t| types.contains(t))
            .cloned()
            .collect()
    };

    let mut items = Vec::with_capacity(raw.items.len());
    for item in &raw.items {
        match item {
            RawItem::Narrow(types) => {
                let narrowed = intersect(types);
                if !narrowed.is_empty() && narrowed.len() < target_possible.len() {
                    items.push(RawItem::Narrow(narrowed));
                }
            }
            RawItem::Field(field) => {
                let Some(applies_to) =
                    rescope(&field.applies_to, source_possible, target_possible, &intersect)
                else {
                    continue;
                };
                items.push(RawItem::Field(RawField {
                    applies_to,
                    conditional: field.conditional || inherited.conditional,
                    deferred: field.deferred || inherited.deferred,
                    ..field.clone()
                }));
            }
            RawItem::Spread(spread) => {
                let Some(applies_to) =
                    rescope(&spread.applies_to, source_possible, target_possible, &intersect)
                else {
                    continue;
                };
                items.push(RawItem::Spread(RawSpread {
                    applies_to,
                    conditional: spread.conditional || inherited.conditional,
                    deferred: spread.deferred || inherited.deferred,
                    ..spread.clone()
                }));
            }
            RawItem::Use(fragment) => {
                let Some(applies_to) =
                    rescope(&fragment.applies_to, source_possible, target_possible, &intersect)
                else {
                    continue;
                };
                items.push(RawItem::Use(RawUse {
                    applies_to,
                    conditional: fragment.conditional || inherited.conditional,
                    deferred: fragment.deferred || inherited.deferred,
                    ..fragment.clone()
                }));
            }
        }
    }
    items
}

fn rescope(
    applies_to: &Applicability,
    source_possible: &[Arc<str>],
    target_possible: &[Arc<str>],
    intersect: &impl Fn(&[Arc<str>]) -> Vec<Arc<str>>,
) -> Option<Applicability> {
    let types = intersect(applies_to.types(source_possible));
    if types.is_empty() {
        return None;
    }
    Some(Applicability::from_types(types, target_possible))
}
