//! Fragment Registry: every fragment definition visible to one run, indexed
//! by name, with per-fragment caches.

use crate::error::{DefinitionRef, ResolutionError, ResponsePath, Result};
use crate::raw::RawSelectionSet;
use crate::resolver::Resolver;
use crate::shape::SelectionShape;
use crate::walker::{Frame, SelectionWalker, SpreadHandling};
use apollo_compiler::collections::IndexMap;
use apollo_compiler::{ast, Node};
use graphql_codegen_config::CodegenConfig;
use graphql_hir::{node_range, FragmentStructure, SchemaIndex};
use graphql_syntax::SourceDocument;
use graphql_types::{DocumentOrigin, FileId, SourceLocation};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// A fragment definition together with the document it came from.
#[derive(Debug, Clone)]
pub struct FragmentDefinition {
    pub name: Arc<str>,
    /// The type the fragment is declared on
    pub type_condition: Arc<str>,
    pub file_id: FileId,
    pub node: Node<ast::FragmentDefinition>,
    pub document: SourceDocument,
    pub definition: DefinitionRef,
}

impl FragmentDefinition {
    #[must_use]
    pub fn new(structure: &FragmentStructure, document: &SourceDocument) -> Self {
        Self {
            name: structure.name.clone(),
            type_condition: structure.type_condition.clone(),
            file_id: structure.file_id,
            node: structure.node.clone(),
            document: document.clone(),
            definition: DefinitionRef::fragment(structure.name.clone(), document.uri().clone()),
        }
    }

    #[must_use]
    pub fn origin(&self) -> DocumentOrigin {
        self.document.origin()
    }

    /// Location of the whole definition.
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.document.location(node_range(&self.node))
    }
}

/// Outcome of a successful [`FragmentRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// An identical definition was already registered
    AlreadyRegistered,
}

#[derive(Debug)]
struct FragmentEntry {
    definition: Arc<FragmentDefinition>,
    raw: OnceLock<Arc<RawSelectionSet>>,
    shape: OnceLock<Arc<SelectionShape>>,
    acyclic: OnceLock<()>,
}

/// All fragments of one run.
///
/// Registration happens before any resolution starts; afterwards the registry
/// is only read. The raw-walk and shape caches are filled at most once per
/// fragment, and only on success, so a failing fragment never poisons the
/// cache for anyone else.
#[derive(Debug, Default)]
pub struct FragmentRegistry {
    fragments: IndexMap<Arc<str>, FragmentEntry>,
    walk_count: AtomicUsize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl FragmentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment.
    ///
    /// Registering a definition whose body is identical to the one already
    /// registered under the same name is a no-op.
    pub fn register(&mut self, definition: FragmentDefinition) -> Result<Registration> {
        if let Some(existing) = self.fragments.get(&definition.name) {
            if existing.definition.node.to_string() == definition.node.to_string() {
                tracing::trace!(fragment = %definition.name, "Fragment already registered");
                return Ok(Registration::AlreadyRegistered);
            }
            return Err(ResolutionError::DuplicateFragmentName {
                name: definition.name.clone(),
                existing: existing.definition.document.uri().clone(),
                location: definition.location(),
            });
        }

        tracing::trace!(fragment = %definition.name, origin = ?definition.origin(), "Registered fragment");
        self.fragments.insert(
            definition.name.clone(),
            FragmentEntry {
                definition: Arc::new(definition),
                raw: OnceLock::new(),
                shape: OnceLock::new(),
                acyclic: OnceLock::new(),
            },
        );
        Ok(Registration::Added)
    }

    /// Look up a fragment spread from `referenced_by` at `location`.
    pub fn resolve(
        &self,
        name: &str,
        referenced_by: &DefinitionRef,
        location: &SourceLocation,
    ) -> Result<&Arc<FragmentDefinition>> {
        self.entry(name, referenced_by, location)
            .map(|entry| &entry.definition)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<FragmentDefinition>> {
        self.fragments.get(name).map(|entry| &entry.definition)
    }

    /// The cached shape of a fragment, if it has been resolved.
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<Arc<SelectionShape>> {
        self.fragments.get(name)?.shape.get().cloned()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Arc<FragmentDefinition>> {
        self.fragments.values().map(|entry| &entry.definition)
    }

    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.fragments.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of fragment bodies walked into the raw cache so far.
    #[must_use]
    pub fn walk_count(&self) -> usize {
        self.walk_count.load(Ordering::Relaxed)
    }

    /// All fragments, dependencies before dependents.
    ///
    /// Spreads of unknown fragments are ignored here; they are reported when
    /// the spreading definition is resolved.
    #[tracing::instrument(skip(self), fields(fragments = self.len()))]
    pub fn expansion_order(&self) -> Result<Vec<Arc<str>>> {
        let mut order = Vec::with_capacity(self.len());
        let mut visits = HashMap::new();
        let mut stack = Vec::new();
        for name in self.fragments.keys() {
            self.visit(name, &mut visits, &mut stack, &mut order)?;
        }
        Ok(order)
    }

    /// Fail with [`ResolutionError::CyclicFragment`] if `name` transitively
    /// spreads itself.
    pub fn ensure_acyclic(&self, name: &str) -> Result<()> {
        let Some(entry) = self.fragments.get(name) else {
            return Ok(());
        };
        if entry.acyclic.get().is_some() {
            return Ok(());
        }

        let mut visits = HashMap::new();
        let mut order = Vec::new();
        self.visit(&entry.definition.name, &mut visits, &mut Vec::new(), &mut order)?;
        for visited in order {
            if let Some(entry) = self.fragments.get(&visited) {
                let _ = entry.acyclic.set(());
            }
        }
        Ok(())
    }

    fn visit(
        &self,
        name: &Arc<str>,
        visits: &mut HashMap<Arc<str>, Visit>,
        stack: &mut Vec<Arc<str>>,
        order: &mut Vec<Arc<str>>,
    ) -> Result<()> {
        if visits.get(name) == Some(&Visit::Done) {
            return Ok(());
        }
        let Some(entry) = self.fragments.get(name) else {
            return Ok(());
        };

        visits.insert(name.clone(), Visit::InProgress);
        stack.push(name.clone());

        let definition = &entry.definition;
        let mut spreads = Vec::new();
        collect_spreads(&definition.node.selection_set, &mut spreads);
        for spread in spreads {
            let target: Arc<str> = Arc::from(spread.fragment_name.as_str());
            if visits.get(&target) == Some(&Visit::InProgress) {
                let start = stack.iter().position(|n| *n == target).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(target);
                return Err(ResolutionError::CyclicFragment {
                    cycle,
                    location: definition.document.location(node_range(spread)),
                });
            }
            self.visit(&target, visits, stack, order)?;
        }

        stack.pop();
        visits.insert(name.clone(), Visit::Done);
        order.push(name.clone());
        Ok(())
    }

    fn entry(
        &self,
        name: &str,
        referenced_by: &DefinitionRef,
        location: &SourceLocation,
    ) -> Result<&FragmentEntry> {
        self.fragments
            .get(name)
            .ok_or_else(|| ResolutionError::MissingFragment {
                name: Arc::from(name),
                referenced_by: referenced_by.clone(),
                location: location.clone(),
            })
    }

    /// The fragment's body walked against its own type condition, spreads
    /// kept. Walked at most once.
    pub(crate) fn raw(
        &self,
        name: &str,
        referenced_by: &DefinitionRef,
        location: &SourceLocation,
        index: &SchemaIndex,
    ) -> Result<Arc<RawSelectionSet>> {
        let entry = self.entry(name, referenced_by, location)?;
        if let Some(raw) = entry.raw.get() {
            tracing::trace!(fragment = name, "Raw fragment cache hit");
            return Ok(raw.clone());
        }

        self.ensure_acyclic(name)?;

        let definition = &entry.definition;
        let root = Frame::root(
            &definition.document,
            &definition.definition,
            definition.type_condition.clone(),
            ResponsePath::root(definition.name.clone()),
        );
        let raw = SelectionWalker::new(index, self, SpreadHandling::Preserve).walk(
            &definition.node.selection_set,
            &root,
            &definition.location(),
        )?;
        self.walk_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(fragment = name, items = raw.items.len(), "Walked fragment");

        Ok(entry.raw.get_or_init(|| Arc::new(raw)).clone())
    }

    /// Resolve every fragment's shape, dependencies first, so the registry
    /// can be shared fully populated. Returns the failures by fragment name.
    #[tracing::instrument(skip_all, fields(fragments = self.len()))]
    pub fn prepare(
        &self,
        index: &SchemaIndex,
        config: &CodegenConfig,
    ) -> Vec<(Arc<str>, ResolutionError)> {
        let order = self.expansion_order().unwrap_or_else(|error| {
            tracing::debug!(%error, "Fragments contain a cycle, preparing in registration order");
            self.names().cloned().collect()
        });

        let resolver = Resolver::new(index, self, config);
        let mut errors = Vec::new();
        for name in order {
            let Some(fragment) = self.get(&name) else {
                continue;
            };
            if let Err(error) =
                resolver.fragment_shape(&name, &fragment.definition, &fragment.location())
            {
                errors.push((name, error));
            }
        }
        errors
    }

    /// Cache a resolved fragment shape, returning the cached value.
    pub(crate) fn cache_shape(
        &self,
        name: &str,
        shape: Arc<SelectionShape>,
    ) -> Arc<SelectionShape> {
        match self.fragments.get(name) {
            Some(entry) => entry.shape.get_or_init(|| shape).clone(),
            None => shape,
        }
    }
}

fn collect_spreads<'n>(
    selections: &'n [ast::Selection],
    out: &mut Vec<&'n Node<ast::FragmentSpread>>,
) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => collect_spreads(&field.selection_set, out),
            ast::Selection::InlineFragment(inline) => {
                collect_spreads(&inline.selection_set, out);
            }
            ast::Selection::FragmentSpread(spread) => out.push(spread),
        }
    }
}
