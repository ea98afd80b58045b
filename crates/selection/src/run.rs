//! The run driver: one schema, a set of documents, one registry, one name
//! table.

use crate::error::{DefinitionRef, ResolutionError};
use crate::namer::{name_shapes, NameTable, NamerRoot, RootKind};
use crate::registry::{FragmentDefinition, FragmentRegistry, Registration};
use crate::resolver::Resolver;
use crate::shape::SelectionShape;
use apollo_compiler::Schema;
use graphql_codegen_config::CodegenConfig;
use graphql_hir::{file_structure, ExecutableDefinition, OperationType, SchemaIndex};
use graphql_syntax::{parse_document, SourceDocument};
use graphql_types::{DocumentOrigin, FileId, FileUri, SourceLocation};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A definition that resolved.
#[derive(Debug, Clone)]
pub struct ResolvedDefinition {
    pub definition: DefinitionRef,
    /// `None` for fragments
    pub operation_type: Option<OperationType>,
    pub shape: Arc<SelectionShape>,
    pub location: SourceLocation,
    /// 1-based position among the run's anonymous operations
    pub anonymous_index: Option<usize>,
}

/// What happened to one local operation or fragment.
#[derive(Debug, Clone)]
pub enum DefinitionOutcome {
    Resolved(ResolvedDefinition),
    Failed {
        definition: DefinitionRef,
        error: ResolutionError,
    },
}

impl DefinitionOutcome {
    #[must_use]
    pub const fn definition(&self) -> &DefinitionRef {
        match self {
            Self::Resolved(resolved) => &resolved.definition,
            Self::Failed { definition, .. } => definition,
        }
    }

    #[must_use]
    pub const fn resolved(&self) -> Option<&ResolvedDefinition> {
        match self {
            Self::Resolved(resolved) => Some(resolved),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ResolutionError> {
        match self {
            Self::Resolved(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// The immutable result of a run, shareable across emission adapters.
#[derive(Debug)]
pub struct ResolvedRun {
    index: SchemaIndex,
    config: CodegenConfig,
    registry: FragmentRegistry,
    outcomes: Vec<DefinitionOutcome>,
    names: NameTable,
    registry_errors: Vec<ResolutionError>,
}

impl ResolvedRun {
    #[must_use]
    pub const fn index(&self) -> &SchemaIndex {
        &self.index
    }

    #[must_use]
    pub const fn config(&self) -> &CodegenConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &FragmentRegistry {
        &self.registry
    }

    /// One outcome per local operation and fragment, in source order.
    #[must_use]
    pub fn outcomes(&self) -> &[DefinitionOutcome] {
        &self.outcomes
    }

    pub fn resolved(&self) -> impl Iterator<Item = &ResolvedDefinition> {
        self.outcomes.iter().filter_map(DefinitionOutcome::resolved)
    }

    #[must_use]
    pub const fn names(&self) -> &NameTable {
        &self.names
    }

    /// Every error of the run: failed definitions first, then errors from
    /// fragments that are only visible as external fragments.
    #[must_use]
    pub fn errors(&self) -> Vec<&ResolutionError> {
        self.outcomes
            .iter()
            .filter_map(DefinitionOutcome::error)
            .chain(&self.registry_errors)
            .collect()
    }

    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&ResolvedDefinition> {
        self.resolved()
            .find(|r| r.operation_type.is_some() && r.definition.name.as_deref() == Some(name))
    }

    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&ResolvedDefinition> {
        self.resolved()
            .find(|r| r.operation_type.is_none() && r.definition.name.as_deref() == Some(name))
    }

    /// The resolved shape of any registered fragment, local or external.
    #[must_use]
    pub fn fragment_shape(&self, name: &str) -> Option<Arc<SelectionShape>> {
        self.registry.shape(name)
    }
}

/// Resolve every operation and fragment of `documents`.
///
/// `externals` and the configured external fragments only contribute
/// fragment definitions. Each local definition resolves on its own; one
/// failing never stops the others.
#[tracing::instrument(skip_all, fields(documents = documents.len(), externals = externals.len()))]
pub fn resolve_documents(
    schema: &Schema,
    documents: &[SourceDocument],
    externals: &[SourceDocument],
    config: &CodegenConfig,
) -> ResolvedRun {
    let index = SchemaIndex::new(schema);
    let mut registry = FragmentRegistry::new();
    let mut registry_errors = Vec::new();

    let structures: Vec<_> = documents
        .iter()
        .enumerate()
        .map(|(i, document)| {
            if document.has_errors() {
                tracing::warn!(
                    uri = %document.uri(),
                    errors = document.errors().len(),
                    "Document has syntax errors, resolving what parsed"
                );
            }
            file_structure(FileId::new(i as u32), document.ast())
        })
        .collect();

    // Local fragments keyed by file and start offset: those that failed to
    // register, and those repeating an identical registered definition
    let mut rejected = HashMap::new();
    let mut repeated = HashSet::new();
    for (document, structure) in documents.iter().zip(&structures) {
        for fragment in structure.fragments() {
            let key = (structure.file_id, fragment.fragment_range.start);
            match registry.register(FragmentDefinition::new(fragment, document)) {
                Ok(Registration::Added) => {}
                Ok(Registration::AlreadyRegistered) => {
                    repeated.insert(key);
                }
                Err(error) => {
                    rejected.insert(key, error);
                }
            }
        }
    }

    let config_externals = external_fragment_documents(config);
    let base = documents.len();
    for (i, document) in externals.iter().chain(&config_externals).enumerate() {
        let structure = file_structure(FileId::new((base + i) as u32), document.ast());
        for fragment in structure.fragments() {
            if let Err(error) = registry.register(FragmentDefinition::new(fragment, document)) {
                registry_errors.push(error);
            }
        }
    }
    check_external_fragments(&registry, config);

    tracing::debug!(fragments = registry.len(), "Built fragment registry");

    let resolver = Resolver::new(&index, &registry, config);
    let mut outcomes = Vec::new();
    let mut anonymous_count = 0;
    for (document, structure) in documents.iter().zip(&structures) {
        for definition in &structure.definitions {
            match definition {
                ExecutableDefinition::Operation(operation) => {
                    let anonymous_index = operation.name.is_none().then(|| {
                        anonymous_count += 1;
                        anonymous_count
                    });
                    let definition =
                        DefinitionRef::operation(operation.name.clone(), document.uri().clone());
                    let location = document.location(operation.operation_range);
                    let outcome = match resolver.resolve_operation(operation, document, &definition) {
                        Ok(shape) => DefinitionOutcome::Resolved(ResolvedDefinition {
                            definition,
                            operation_type: Some(operation.operation_type),
                            shape,
                            location,
                            anonymous_index,
                        }),
                        Err(error) => DefinitionOutcome::Failed { definition, error },
                    };
                    log_outcome(&outcome);
                    outcomes.push(outcome);
                }
                ExecutableDefinition::Fragment(fragment) => {
                    let key = (structure.file_id, fragment.fragment_range.start);
                    if repeated.contains(&key) {
                        continue;
                    }
                    let definition =
                        DefinitionRef::fragment(fragment.name.clone(), document.uri().clone());
                    let location = document.location(fragment.fragment_range);

                    let result = match rejected.remove(&key) {
                        Some(error) => Err(error),
                        None => resolver.fragment_shape(&fragment.name, &definition, &location),
                    };
                    let outcome = match result {
                        Ok(shape) => DefinitionOutcome::Resolved(ResolvedDefinition {
                            definition,
                            operation_type: None,
                            shape,
                            location,
                            anonymous_index: None,
                        }),
                        Err(error) => DefinitionOutcome::Failed { definition, error },
                    };
                    log_outcome(&outcome);
                    outcomes.push(outcome);
                }
            }
        }
    }

    // Populate the remaining (external) fragment shapes so the registry is
    // complete before it is shared.
    for (name, error) in registry.prepare(&index, config) {
        if registry
            .get(&name)
            .is_some_and(|fragment| fragment.origin().is_external())
        {
            registry_errors.push(error);
        }
    }

    let names = {
        let external_refs: Vec<(DefinitionRef, Arc<SelectionShape>)> = registry
            .definitions()
            .filter(|fragment| fragment.origin().is_external())
            .filter_map(|fragment| {
                registry
                    .shape(&fragment.name)
                    .map(|shape| (fragment.definition.clone(), shape))
            })
            .collect();

        let mut roots: Vec<NamerRoot<'_>> = outcomes
            .iter()
            .filter_map(DefinitionOutcome::resolved)
            .map(|resolved| NamerRoot {
                definition: &resolved.definition,
                kind: match resolved.operation_type {
                    Some(operation_type) => RootKind::Operation {
                        operation_type,
                        anonymous_index: resolved.anonymous_index,
                    },
                    None => RootKind::Fragment,
                },
                shape: &resolved.shape,
            })
            .collect();
        roots.extend(external_refs.iter().map(|(definition, shape)| NamerRoot {
            definition,
            kind: RootKind::Fragment,
            shape,
        }));
        name_shapes(&roots, config)
    };

    tracing::info!(
        definitions = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.error().is_some()).count(),
        shapes = names.len(),
        "Resolution run complete"
    );

    ResolvedRun {
        index,
        config: config.clone(),
        registry,
        outcomes,
        names,
        registry_errors,
    }
}

/// Parse the fragment sources declared in the config.
fn external_fragment_documents(config: &CodegenConfig) -> Vec<SourceDocument> {
    config
        .external_fragments
        .iter()
        .map(|fragment| {
            let uri = FileUri::new(format!("external://{}", fragment.name));
            let document = parse_document(&fragment.document, uri, DocumentOrigin::External);
            if document.has_errors() {
                tracing::warn!(fragment = %fragment.name, "External fragment document has syntax errors");
            }
            document
        })
        .collect()
}

/// Declared names and types of external fragments are informational; a
/// mismatch with the actual definition is logged, not fatal.
fn check_external_fragments(registry: &FragmentRegistry, config: &CodegenConfig) {
    for declared in &config.external_fragments {
        match registry.get(&declared.name) {
            None => tracing::warn!(
                fragment = %declared.name,
                "External fragment document does not define a fragment with the declared name"
            ),
            Some(fragment) if *fragment.type_condition != *declared.on_type => tracing::warn!(
                fragment = %declared.name,
                declared = %declared.on_type,
                actual = %fragment.type_condition,
                "External fragment is declared on a different type"
            ),
            Some(_) => {}
        }
    }
}

fn log_outcome(outcome: &DefinitionOutcome) {
    match outcome {
        DefinitionOutcome::Resolved(resolved) => tracing::debug!(
            definition = %resolved.definition,
            fields = resolved.shape.own_fields.len(),
            variants = resolved.shape.inline_variants.len(),
            "Resolved definition"
        ),
        DefinitionOutcome::Failed { definition, error } => tracing::debug!(
            definition = %definition,
            kind = error.kind(),
            %error,
            "Definition failed to resolve"
        ),
    }
}
