//! Selection Walker: turns one selection set into a raw selection set,
//! validating fields, sub-selections and type conditions as it goes.

use crate::error::{DefinitionRef, ResolutionError, ResponsePath, Result};
use crate::raw::{Applicability, RawField, RawItem, RawSelectionSet, RawSpread};
use crate::registry::FragmentRegistry;
use apollo_compiler::ast;
use graphql_hir::{node_range, SchemaIndex, SelectionDirectives};
use graphql_syntax::SourceDocument;
use graphql_types::SourceLocation;
use std::sync::Arc;

/// What the walker does with fragment spreads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpreadHandling {
    /// Record every spread for the resolver pass
    Preserve,
    /// Walk fragment bodies in place. With `masks` set, spreads without
    /// `@unmask` are still recorded.
    Flatten { masks: bool },
}

/// Where the walker currently is.
#[derive(Debug, Clone)]
pub(crate) struct Frame<'a> {
    document: &'a SourceDocument,
    /// The definition whose body is being walked
    definition: &'a DefinitionRef,
    applies: Applicability,
    /// Type that fields are looked up on
    lookup: Arc<str>,
    conditional: bool,
    deferred: bool,
    path: ResponsePath,
}

impl<'a> Frame<'a> {
    pub(crate) fn root(
        document: &'a SourceDocument,
        definition: &'a DefinitionRef,
        scope: Arc<str>,
        path: ResponsePath,
    ) -> Self {
        Self {
            document,
            definition,
            applies: Applicability::All,
            lookup: scope,
            conditional: false,
            deferred: false,
            path,
        }
    }

    fn with_directives(&self, directives: SelectionDirectives) -> Self {
        Self {
            conditional: self.conditional || directives.conditional,
            deferred: self.deferred || directives.deferred,
            ..self.clone()
        }
    }

    fn location<T>(&self, node: &apollo_compiler::Node<T>) -> SourceLocation {
        self.document.location(node_range(node))
    }
}

pub(crate) struct SelectionWalker<'a> {
    index: &'a SchemaIndex,
    registry: &'a FragmentRegistry,
    spreads: SpreadHandling,
    /// Fragments currently being walked in place, outermost first
    stack: Vec<Arc<str>>,
}

impl<'a> SelectionWalker<'a> {
    pub(crate) fn new(
        index: &'a SchemaIndex,
        registry: &'a FragmentRegistry,
        spreads: SpreadHandling,
    ) -> Self {
        Self {
            index,
            registry,
            spreads,
            stack: Vec::new(),
        }
    }

    /// Walk a fragment's own body; spreads of the fragment back into itself
    /// are reported as cycles.
    pub(crate) fn for_fragment(mut self, name: Arc<str>) -> Self {
        self.stack.push(name);
        self
    }

    /// Walk the top-level selection set of an operation or fragment whose
    /// scope is `root.lookup`.
    pub(crate) fn walk(
        &mut self,
        selections: &[ast::Selection],
        root: &Frame<'a>,
        location: &SourceLocation,
    ) -> Result<RawSelectionSet> {
        let scope = root.lookup.clone();
        match self.index.kind_of(&scope) {
            None => {
                return Err(ResolutionError::UnknownType {
                    name: scope,
                    location: location.clone(),
                })
            }
            Some(kind) if !kind.is_composite() => {
                return Err(ResolutionError::InvalidTypeCondition {
                    type_condition: scope.clone(),
                    parent_type: scope,
                    path: root.path.clone(),
                    location: location.clone(),
                })
            }
            Some(_) => {}
        }

        let mut items = Vec::new();
        self.walk_selections(&scope, selections, root, &mut items)?;
        Ok(RawSelectionSet { scope, items })
    }

    fn walk_selections(
        &mut self,
        scope: &Arc<str>,
        selections: &[ast::Selection],
        frame: &Frame<'a>,
        out: &mut Vec<RawItem>,
    ) -> Result<()> {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => self.walk_field(field, frame, out)?,
                ast::Selection::InlineFragment(inline) => {
                    let mut inner = frame.with_directives(SelectionDirectives::from_ast(
                        &inline.directives,
                    ));
                    if let Some(condition) = &inline.type_condition {
                        let location = frame.location(inline);
                        self.narrow(scope, condition.as_str(), &location, &mut inner, out)?;
                    }
                    self.walk_selections(scope, &inline.selection_set, &inner, out)?;
                }
                ast::Selection::FragmentSpread(spread) => {
                    self.walk_spread(scope, spread, frame, out)?;
                }
            }
        }
        Ok(())
    }

    fn walk_field(
        &mut self,
        field: &apollo_compiler::Node<ast::Field>,
        frame: &Frame<'a>,
        out: &mut Vec<RawItem>,
    ) -> Result<()> {
        let name = field.name.as_str();
        let output_name: Arc<str> = Arc::from(field.alias.as_ref().unwrap_or(&field.name).as_str());
        let location = frame.location(field);
        let path = frame.path.child(output_name.clone());
        let directives = SelectionDirectives::from_ast(&field.directives);

        let Some(definition) = self.index.field_of(&frame.lookup, name) else {
            return Err(ResolutionError::UnknownField {
                field: Arc::from(name),
                type_name: frame.lookup.clone(),
                path,
                location,
            });
        };

        let nested = if definition.ty.is_leaf() {
            if !field.selection_set.is_empty() {
                return Err(ResolutionError::UnexpectedSubselection {
                    field: definition.name,
                    type_name: definition.ty.name().clone(),
                    path,
                    location,
                });
            }
            None
        } else {
            if field.selection_set.is_empty() {
                return Err(ResolutionError::MissingSubselection {
                    field: definition.name,
                    type_name: definition.ty.name().clone(),
                    path,
                    location,
                });
            }
            let nested_scope = definition.ty.name().clone();
            let nested_frame = Frame::root(
                frame.document,
                frame.definition,
                nested_scope.clone(),
                path.clone(),
            );
            let mut items = Vec::new();
            self.walk_selections(&nested_scope, &field.selection_set, &nested_frame, &mut items)?;
            Some(Arc::new(RawSelectionSet {
                scope: nested_scope,
                items,
            }))
        };

        out.push(RawItem::Field(RawField {
            applies_to: frame.applies.clone(),
            lookup_type: frame.lookup.clone(),
            field: definition,
            output_name,
            nested,
            conditional: frame.conditional || directives.conditional,
            deferred: frame.deferred || directives.deferred,
            location,
            path,
        }));
        Ok(())
    }

    fn walk_spread(
        &mut self,
        scope: &Arc<str>,
        spread: &apollo_compiler::Node<ast::FragmentSpread>,
        frame: &Frame<'a>,
        out: &mut Vec<RawItem>,
    ) -> Result<()> {
        let name: Arc<str> = Arc::from(spread.fragment_name.as_str());
        let location = frame.location(spread);
        let directives = SelectionDirectives::from_ast(&spread.directives);
        let registry = self.registry;
        let fragment = registry.resolve(&name, frame.definition, &location)?;

        let expand = match self.spreads {
            SpreadHandling::Preserve => false,
            SpreadHandling::Flatten { masks } => !masks || directives.unmask,
        };

        let mut inner = frame.with_directives(directives);
        if !expand {
            // The resolver records the narrowing when it expands the spread
            let mut discarded = Vec::new();
            self.narrow(
                scope,
                &fragment.type_condition,
                &location,
                &mut inner,
                &mut discarded,
            )?;
            out.push(RawItem::Spread(RawSpread {
                applies_to: inner.applies,
                name,
                conditional: inner.conditional,
                deferred: inner.deferred,
                unmask: directives.unmask,
                location,
                referenced_by: frame.definition.clone(),
            }));
            return Ok(());
        }

        if let Some(start) = self.stack.iter().position(|n| *n == name) {
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(name);
            return Err(ResolutionError::CyclicFragment { cycle, location });
        }

        self.narrow(scope, &fragment.type_condition, &location, &mut inner, out)?;
        inner.document = &fragment.document;
        inner.definition = &fragment.definition;

        tracing::trace!(fragment = %name, scope = %scope, "Flattening fragment spread");
        self.stack.push(name);
        let result = self.walk_selections(scope, &fragment.node.selection_set, &inner, out);
        self.stack.pop();
        result
    }

    /// Apply a type condition to `frame`, recording the narrowing in `out`.
    fn narrow(
        &self,
        scope: &str,
        condition: &str,
        location: &SourceLocation,
        frame: &mut Frame<'a>,
        out: &mut Vec<RawItem>,
    ) -> Result<()> {
        if self.index.get(condition).is_none() {
            return Err(ResolutionError::UnknownType {
                name: Arc::from(condition),
                location: location.clone(),
            });
        }

        let condition_types = self.index.possible_types_of(condition);
        let overlaps = self
            .index
            .possible_types_of(&frame.lookup)
            .iter()
            .any(|t| condition_types.contains(t));
        if !overlaps {
            return Err(ResolutionError::InvalidTypeCondition {
                type_condition: Arc::from(condition),
                parent_type: frame.lookup.clone(),
                path: frame.path.clone(),
                location: location.clone(),
            });
        }

        let applies = frame
            .applies
            .narrow(condition_types, self.index.possible_types_of(scope));
        tracing::trace!(scope, condition, ?applies, "Narrowed by type condition");
        if let Applicability::Only(types) = &applies {
            if !types.is_empty() {
                out.push(RawItem::Narrow(types.clone()));
            }
        }
        frame.applies = applies;
        frame.lookup = Arc::from(condition);
        Ok(())
    }
}
