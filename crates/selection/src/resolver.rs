//! Fragment Resolver: expands the spreads the walker left behind, merges
//! fields by output name and splits abstract shapes into per-type variants.

use crate::error::{DefinitionRef, ResolutionError, ResponsePath, Result};
use crate::raw::{project, Applicability, Inherited, RawField, RawItem, RawSelectionSet, RawUse};
use crate::registry::FragmentRegistry;
use crate::shape::{
    FieldSelection, FragmentUse, FragmentUseState, SelectionShape, TypeConditionalVariant,
};
use crate::walker::{Frame, SelectionWalker, SpreadHandling};
use apollo_compiler::collections::IndexMap;
use graphql_codegen_config::{CodegenConfig, FragmentMode};
use graphql_hir::{FieldDef, OperationStructure, SchemaIndex, TYPENAME_FIELD};
use graphql_syntax::SourceDocument;
use graphql_types::SourceLocation;
use std::sync::Arc;

/// Resolves operations and fragments of one run into shapes.
///
/// Borrowed state only: the registry's caches are the single place results
/// are kept between calls.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    index: &'a SchemaIndex,
    registry: &'a FragmentRegistry,
    config: &'a CodegenConfig,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub const fn new(
        index: &'a SchemaIndex,
        registry: &'a FragmentRegistry,
        config: &'a CodegenConfig,
    ) -> Self {
        Self {
            index,
            registry,
            config,
        }
    }

    fn spread_handling(&self) -> SpreadHandling {
        if self.config.flatten_fragments {
            SpreadHandling::Flatten {
                masks: self.config.masks_spreads(),
            }
        } else {
            SpreadHandling::Preserve
        }
    }

    /// Resolve an operation against its root type.
    #[tracing::instrument(skip_all, fields(operation = definition.display_name()))]
    pub fn resolve_operation(
        &self,
        operation: &OperationStructure,
        document: &SourceDocument,
        definition: &DefinitionRef,
    ) -> Result<Arc<SelectionShape>> {
        let location = document.location(operation.operation_range);
        let Some(root_type) = self.index.root_type(operation.operation_type) else {
            return Err(ResolutionError::MissingRootType {
                operation_type: operation.operation_type,
                definition: definition.clone(),
                location,
            });
        };

        let path = ResponsePath::root(definition.display_name());
        let root = Frame::root(document, definition, root_type.clone(), path);
        let raw = SelectionWalker::new(self.index, self.registry, self.spread_handling()).walk(
            &operation.node.selection_set,
            &root,
            &location,
        )?;

        let items = self.expand(&raw.items, &raw.scope)?;
        self.build(&raw.scope, &items, 0, true, &location)
    }

    /// Resolve a fragment's own shape, cached in the registry.
    #[tracing::instrument(skip(self, referenced_by, location))]
    pub fn fragment_shape(
        &self,
        name: &str,
        referenced_by: &DefinitionRef,
        location: &SourceLocation,
    ) -> Result<Arc<SelectionShape>> {
        if let Some(shape) = self.registry.shape(name) {
            tracing::trace!("Fragment shape cache hit");
            return Ok(shape);
        }

        let fragment = self.registry.resolve(name, referenced_by, location)?;
        let definition_location = fragment.location();

        let raw = if self.config.flatten_fragments {
            let root = Frame::root(
                &fragment.document,
                &fragment.definition,
                fragment.type_condition.clone(),
                ResponsePath::root(fragment.name.clone()),
            );
            Arc::new(
                SelectionWalker::new(self.index, self.registry, self.spread_handling())
                    .for_fragment(fragment.name.clone())
                    .walk(&fragment.node.selection_set, &root, &definition_location)?,
            )
        } else {
            self.registry
                .raw(name, referenced_by, location, self.index)?
        };

        let items = self.expand(&raw.items, &raw.scope)?;
        let shape = self.build(&raw.scope, &items, 0, false, &definition_location)?;
        tracing::debug!(fragment = name, "Resolved fragment shape");
        Ok(self.registry.cache_shape(name, shape))
    }

    /// Replace spreads with inlined items or fragment references, according
    /// to the fragment mode.
    fn expand(&self, items: &[RawItem], scope: &Arc<str>) -> Result<Vec<RawItem>> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let RawItem::Spread(spread) = item else {
                out.push(item.clone());
                continue;
            };

            let fragment =
                self.registry
                    .resolve(&spread.name, &spread.referenced_by, &spread.location)?;
            let raw = self.registry.raw(
                &spread.name,
                &spread.referenced_by,
                &spread.location,
                self.index,
            )?;

            if let Applicability::Only(types) = &spread.applies_to {
                if !types.is_empty() {
                    out.push(RawItem::Narrow(types.clone()));
                }
            }

            let state = match self.config.fragment_mode {
                FragmentMode::Combine if !spread.unmask => Some(FragmentUseState::Combined),
                FragmentMode::Mask if !spread.unmask => Some(FragmentUseState::Masked),
                _ => None,
            };

            match state {
                None => {
                    tracing::trace!(fragment = %spread.name, scope = %scope, "Inlining fragment spread");
                    let inherited = Inherited {
                        conditional: spread.conditional,
                        deferred: spread.deferred,
                    };
                    let projected =
                        project(&raw, scope, &spread.applies_to, inherited, self.index);
                    out.extend(self.expand(&projected, scope)?);
                }
                Some(state) => {
                    out.push(RawItem::Use(RawUse {
                        applies_to: spread.applies_to.clone(),
                        name: spread.name.clone(),
                        type_condition: fragment.type_condition.clone(),
                        state,
                        conditional: spread.conditional,
                        deferred: spread.deferred,
                    }));
                }
            }
        }
        Ok(out)
    }

    /// Build the shape for expanded `items` whose applicability is relative
    /// to `scope`.
    fn build(
        &self,
        scope: &Arc<str>,
        items: &[RawItem],
        depth: usize,
        is_root: bool,
        location: &SourceLocation,
    ) -> Result<Arc<SelectionShape>> {
        let Some(base_type) = self.index.named_type(scope) else {
            return Err(ResolutionError::UnknownType {
                name: scope.clone(),
                location: location.clone(),
            });
        };

        let mut own_fields = self.merge_fields(scope, items, depth)?;
        self.add_typename(scope, &mut own_fields);

        let mut fragment_spreads: Vec<FragmentUse> = Vec::new();
        for item in items {
            if let RawItem::Use(fragment) = item {
                if fragment.applies_to != Applicability::All {
                    continue;
                }
                // Repeated spreads of one fragment merge like repeated fields
                if let Some(existing) = fragment_spreads
                    .iter_mut()
                    .find(|u| u.name == fragment.name)
                {
                    existing.conditional &= fragment.conditional;
                    existing.deferred &= fragment.deferred;
                } else {
                    fragment_spreads.push(FragmentUse {
                        name: fragment.name.clone(),
                        type_condition: fragment.type_condition.clone(),
                        state: fragment.state,
                        conditional: fragment.conditional,
                        deferred: fragment.deferred,
                    });
                }
            }
        }

        let mut variant_types: Vec<Arc<str>> = Vec::new();
        for item in items {
            for type_name in item.narrowed_types() {
                if !variant_types.contains(type_name) {
                    variant_types.push(type_name.clone());
                }
            }
        }

        let mut inline_variants = Vec::with_capacity(variant_types.len());
        if !variant_types.is_empty() {
            let all_items = RawSelectionSet {
                scope: scope.clone(),
                items: items.to_vec(),
            };
            for type_name in variant_types {
                tracing::trace!(scope = %scope, variant = %type_name, "Building type-conditional variant");
                let variant_items = project(
                    &all_items,
                    &type_name,
                    &Applicability::All,
                    Inherited::default(),
                    self.index,
                );
                let shape = self.build(&type_name, &variant_items, depth, false, location)?;
                inline_variants.push(TypeConditionalVariant { type_name, shape });
            }
        }

        Ok(Arc::new(SelectionShape {
            base_type,
            own_fields,
            fragment_spreads,
            inline_variants,
            is_root,
        }))
    }

    /// Group the fields that apply to every possible type by output name and
    /// merge each group into one field.
    fn merge_fields(
        &self,
        scope: &Arc<str>,
        items: &[RawItem],
        depth: usize,
    ) -> Result<Vec<FieldSelection>> {
        let mut groups: IndexMap<Arc<str>, Vec<&RawField>> = IndexMap::default();
        for item in items {
            if let RawItem::Field(field) = item {
                if field.applies_to == Applicability::All {
                    groups
                        .entry(field.output_name.clone())
                        .or_default()
                        .push(field);
                }
            }
        }

        let mut fields = Vec::with_capacity(groups.len());
        for (output_name, occurrences) in groups {
            let Some((first, rest)) = occurrences.split_first() else {
                continue;
            };
            let definition = self.field_on(scope, first);
            for occurrence in rest {
                let other = self.field_on(scope, occurrence);
                if other.name != definition.name || other.ty != definition.ty {
                    return Err(ResolutionError::ConflictingAlias {
                        output_name,
                        existing: format!("{}: {}", definition.name, definition.ty.ty),
                        conflicting: format!("{}: {}", other.name, other.ty.ty),
                        path: occurrence.path.clone(),
                        location: occurrence.location.clone(),
                    });
                }
            }
            if !rest.is_empty() {
                tracing::trace!(field = %output_name, occurrences = occurrences.len(), "Merging field occurrences");
            }

            let nested = if definition.ty.is_leaf() {
                None
            } else {
                if depth + 1 > self.config.max_depth {
                    return Err(ResolutionError::DepthLimitExceeded {
                        limit: self.config.max_depth,
                        path: first.path.clone(),
                        location: first.location.clone(),
                    });
                }
                let nested_scope = definition.ty.name().clone();
                let mut nested_items = Vec::new();
                for occurrence in &occurrences {
                    if let Some(nested) = &occurrence.nested {
                        nested_items.extend(project(
                            nested,
                            &nested_scope,
                            &Applicability::All,
                            Inherited::default(),
                            self.index,
                        ));
                    }
                }
                let expanded = self.expand(&nested_items, &nested_scope)?;
                Some(self.build(
                    &nested_scope,
                    &expanded,
                    depth + 1,
                    false,
                    &first.location,
                )?)
            };

            fields.push(FieldSelection {
                field_name: definition.name.clone(),
                output_name,
                ty: definition.ty.clone(),
                nested,
                conditional: occurrences.iter().all(|o| o.conditional),
                deferred: occurrences.iter().all(|o| o.deferred),
                synthesized: false,
            });
        }
        Ok(fields)
    }

    /// The field as declared on the shape's own type, falling back to the
    /// type it was looked up on (union shapes declare no fields).
    fn field_on(&self, scope: &str, field: &RawField) -> FieldDef {
        self.index
            .field_of(scope, &field.field.name)
            .unwrap_or_else(|| field.field.clone())
    }

    /// Root operation types are skipped wherever they appear, including
    /// fragments declared on them.
    fn add_typename(&self, scope: &str, fields: &mut Vec<FieldSelection>) {
        if !self.config.add_typename
            || (self.config.skip_typename_for_root && self.index.is_root_type(scope))
            || fields.iter().any(|f| f.field_name.as_ref() == TYPENAME_FIELD)
        {
            return;
        }
        let Some(typename) = self.index.field_of(scope, TYPENAME_FIELD) else {
            return;
        };
        fields.insert(
            0,
            FieldSelection {
                field_name: typename.name.clone(),
                output_name: typename.name,
                ty: typename.ty,
                nested: None,
                conditional: !self.config.non_optional_typename,
                deferred: false,
                synthesized: true,
            },
        );
    }
}
