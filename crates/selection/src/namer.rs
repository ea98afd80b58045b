//! Shape Namer/Deduplicator: one stable identifier per distinct shape.
//!
//! Roots (operations and fragments) are named after their definition and
//! are never merged with other shapes. Every other shape is named after its
//! path and shares the name of an earlier structurally identical shape.

use crate::error::DefinitionRef;
use crate::shape::SelectionShape;
use graphql_codegen_config::{CodegenConfig, NamingConvention};
use graphql_hir::OperationType;
use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// One step from a root shape towards a nested shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// The nested shape of the field with this output name
    Field(Arc<str>),
    /// The variant for this concrete type
    Variant(Arc<str>),
}

/// Identifies a shape by how it is reached from a definition's root shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapePath {
    pub definition: DefinitionRef,
    pub segments: Vec<PathSegment>,
}

impl ShapePath {
    #[must_use]
    pub const fn root(definition: DefinitionRef) -> Self {
        Self {
            definition,
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(&self, output_name: impl Into<Arc<str>>) -> Self {
        self.child(PathSegment::Field(output_name.into()))
    }

    #[must_use]
    pub fn variant(&self, type_name: impl Into<Arc<str>>) -> Self {
        self.child(PathSegment::Variant(type_name.into()))
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            definition: self.definition.clone(),
            segments,
        }
    }
}

impl fmt::Display for ShapePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition.display_name())?;
        for segment in &self.segments {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Variant(type_name) => write!(f, "<{type_name}>")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedShapeEntry {
    pub path: ShapePath,
    pub name: Arc<str>,
    /// The name was reused from an earlier, structurally identical shape
    pub deduplicated: bool,
    /// Set for the root shape of a fragment
    pub fragment: Option<Arc<str>>,
}

/// Generated identifiers for every shape of a run, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    entries: Vec<NamedShapeEntry>,
    by_path: HashMap<ShapePath, usize>,
    fragments: HashMap<Arc<str>, Arc<str>>,
}

impl NameTable {
    #[must_use]
    pub fn entries(&self) -> &[NamedShapeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn name_of(&self, path: &ShapePath) -> Option<&str> {
        self.by_path
            .get(path)
            .map(|&i| self.entries[i].name.as_ref())
    }

    #[must_use]
    pub fn entry(&self, path: &ShapePath) -> Option<&NamedShapeEntry> {
        self.by_path.get(path).map(|&i| &self.entries[i])
    }

    /// The identifier of a fragment's root shape, for rendering references
    /// to it.
    #[must_use]
    pub fn fragment_type_name(&self, fragment: &str) -> Option<&str> {
        self.fragments.get(fragment).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Operation {
        operation_type: OperationType,
        /// 1-based position among the run's anonymous operations
        anonymous_index: Option<usize>,
    },
    Fragment,
}

/// A root shape handed to the namer.
#[derive(Debug, Clone, Copy)]
pub struct NamerRoot<'s> {
    pub definition: &'s DefinitionRef,
    pub kind: RootKind,
    pub shape: &'s SelectionShape,
}

/// Name every shape reachable from `roots`.
///
/// Roots are visited in the given order, fields in selection order, nested
/// shapes depth-first. Fragment roots are named before anything else so that
/// a fragment keeps its own name wherever it appears.
#[tracing::instrument(skip_all, fields(roots = roots.len()))]
pub fn name_shapes(roots: &[NamerRoot<'_>], config: &CodegenConfig) -> NameTable {
    let mut namer = ShapeNamer {
        config,
        taken: HashSet::new(),
        by_fingerprint: HashMap::new(),
        fragment_stems: HashMap::new(),
        table: NameTable::default(),
    };

    for root in roots {
        if root.kind == RootKind::Fragment {
            namer.claim_fragment(root);
        }
    }
    for root in roots {
        namer.name_root(root);
    }

    tracing::debug!(shapes = namer.table.len(), "Named shapes");
    namer.table
}

struct ShapeNamer<'c> {
    config: &'c CodegenConfig,
    taken: HashSet<Arc<str>>,
    /// Structural fingerprint to assigned name and stem
    by_fingerprint: HashMap<String, (Arc<str>, String)>,
    /// Fragment name to the stem its root was claimed under
    fragment_stems: HashMap<Arc<str>, (Arc<str>, String)>,
    table: NameTable,
}

impl ShapeNamer<'_> {
    fn claim_fragment(&mut self, root: &NamerRoot<'_>) {
        let Some(fragment) = root.definition.name.clone() else {
            return;
        };
        if self.fragment_stems.contains_key(&fragment) {
            return;
        }
        let stem = format!("{fragment}{}", self.config.fragment_suffix);
        let (name, stem) = self.claim(&stem);
        self.by_fingerprint
            .entry(root.shape.fingerprint())
            .or_insert_with(|| (name.clone(), stem.clone()));
        self.table.fragments.insert(fragment.clone(), name.clone());
        self.fragment_stems.insert(fragment, (name, stem));
    }

    fn name_root(&mut self, root: &NamerRoot<'_>) {
        let path = ShapePath::root(root.definition.clone());
        let (name, stem) = match root.kind {
            RootKind::Fragment => {
                let Some(claimed) = root
                    .definition
                    .name
                    .as_ref()
                    .and_then(|fragment| self.fragment_stems.get(fragment))
                else {
                    return;
                };
                claimed.clone()
            }
            RootKind::Operation {
                operation_type,
                anonymous_index,
            } => {
                let stem = self.operation_stem(root.definition, operation_type, anonymous_index);
                self.claim(&stem)
            }
        };

        let fragment = match root.kind {
            RootKind::Fragment => root.definition.name.clone(),
            RootKind::Operation { .. } => None,
        };
        let variant_stem = fragment_variant_stem(root, self.config);
        self.record(path.clone(), name, false, fragment);
        self.name_children(root.shape, &path, &stem, variant_stem);
    }

    fn operation_stem(
        &self,
        definition: &DefinitionRef,
        operation_type: OperationType,
        anonymous_index: Option<usize>,
    ) -> String {
        let suffix = operation_type.suffix();
        let name = match &definition.name {
            Some(name) => name.to_string(),
            None => format!("Unnamed_{}_", anonymous_index.unwrap_or(1)),
        };
        if self.config.omit_operation_suffix
            || (self.config.dedupe_operation_suffix && name.ends_with(suffix))
        {
            name
        } else {
            format!("{name}{suffix}")
        }
    }

    /// Name the nested field shapes and variants of `shape`.
    ///
    /// `variant_stem` overrides how variant stems are derived; fragment roots
    /// name their variants `<Fragment>_<Type>_<suffix>`.
    fn name_children(
        &mut self,
        shape: &SelectionShape,
        path: &ShapePath,
        stem: &str,
        variant_stem: Option<(String, String)>,
    ) {
        for field in &shape.own_fields {
            if let Some(nested) = &field.nested {
                let child_stem = format!("{stem}_{}", field.output_name);
                self.name_anonymous(nested, &path.field(field.output_name.clone()), &child_stem);
            }
        }
        for variant in &shape.inline_variants {
            let child_stem = match &variant_stem {
                Some((prefix, suffix)) => format!("{prefix}_{}_{suffix}", variant.type_name),
                None => format!("{stem}_{}", variant.type_name),
            };
            self.name_anonymous(
                &variant.shape,
                &path.variant(variant.type_name.clone()),
                &child_stem,
            );
        }
    }

    fn name_anonymous(&mut self, shape: &SelectionShape, path: &ShapePath, candidate: &str) {
        let fingerprint = shape.fingerprint();
        if let Some((name, stem)) = self.by_fingerprint.get(&fingerprint).cloned() {
            tracing::trace!(%path, %name, "Reusing name of identical shape");
            self.record(path.clone(), name, true, None);
            self.name_children(shape, path, &stem, None);
            return;
        }

        let (name, stem) = self.claim(candidate);
        self.by_fingerprint
            .insert(fingerprint, (name.clone(), stem.clone()));
        self.record(path.clone(), name, false, None);
        self.name_children(shape, path, &stem, None);
    }

    /// Reserve the identifier for `stem`, appending `_2`, `_3`, ... while it
    /// is taken. Returns the identifier and the stem it was derived from.
    fn claim(&mut self, stem: &str) -> (Arc<str>, String) {
        let mut candidate = stem.to_string();
        let mut name = self.identifier(&candidate);
        let mut counter = 1;
        while self.taken.contains(&name) {
            counter += 1;
            candidate = format!("{stem}_{counter}");
            name = self.identifier(&candidate);
        }
        self.taken.insert(name.clone());
        (name, candidate)
    }

    fn identifier(&self, stem: &str) -> Arc<str> {
        let converted = convert_name(stem, self.config);
        Arc::from(format!(
            "{}{converted}{}",
            self.config.types_prefix, self.config.types_suffix
        ))
    }

    fn record(
        &mut self,
        path: ShapePath,
        name: Arc<str>,
        deduplicated: bool,
        fragment: Option<Arc<str>>,
    ) {
        self.table.by_path.insert(path.clone(), self.table.entries.len());
        self.table.entries.push(NamedShapeEntry {
            path,
            name,
            deduplicated,
            fragment,
        });
    }
}

fn fragment_variant_stem(root: &NamerRoot<'_>, config: &CodegenConfig) -> Option<(String, String)> {
    match root.kind {
        RootKind::Fragment => Some((
            root.definition.display_name().to_string(),
            config.fragment_suffix.clone(),
        )),
        RootKind::Operation { .. } => None,
    }
}

/// Apply the configured naming convention.
///
/// Unless `transformUnderscore` is set, each `_`-separated part is
/// converted on its own and the underscores are kept.
#[must_use]
pub fn convert_name(name: &str, config: &CodegenConfig) -> String {
    let convention = config.naming_convention;
    if config.transform_underscore {
        return apply_convention(name, convention);
    }
    name.split('_')
        .map(|part| apply_convention(part, convention))
        .collect::<Vec<_>>()
        .join("_")
}

fn apply_convention(value: &str, convention: NamingConvention) -> String {
    match convention {
        NamingConvention::PascalCase => value.to_upper_camel_case(),
        NamingConvention::CamelCase => value.to_lower_camel_case(),
        NamingConvention::ConstantCase => value.to_shouty_snake_case(),
        NamingConvention::SnakeCase => value.to_snake_case(),
        NamingConvention::Keep => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CodegenConfig {
        CodegenConfig::default()
    }

    #[test]
    fn test_convert_name_keeps_underscores_by_default() {
        let config = config();
        assert_eq!(convert_name("FeedQuery_feed_postedBy", &config), "FeedQuery_Feed_PostedBy");
        assert_eq!(convert_name("Unnamed_1_Query", &config), "Unnamed_1_Query");
    }

    #[test]
    fn test_convert_name_transform_underscore() {
        let config = CodegenConfig {
            transform_underscore: true,
            ..config()
        };
        assert_eq!(convert_name("FeedQuery_feed", &config), "FeedQueryFeed");
    }

    #[test]
    fn test_convert_name_conventions() {
        let convert = |convention| {
            let config = CodegenConfig {
                naming_convention: convention,
                ..config()
            };
            convert_name("userFields", &config)
        };
        assert_eq!(convert(NamingConvention::PascalCase), "UserFields");
        assert_eq!(convert(NamingConvention::CamelCase), "userFields");
        assert_eq!(convert(NamingConvention::ConstantCase), "USER_FIELDS");
        assert_eq!(convert(NamingConvention::SnakeCase), "user_fields");
        assert_eq!(convert(NamingConvention::Keep), "userFields");
    }

    #[test]
    fn test_shape_path_display() {
        let definition = DefinitionRef::operation(
            Some(Arc::from("Search")),
            graphql_types::FileUri::new("search.graphql"),
        );
        let path = ShapePath::root(definition).field("search").variant("User");
        assert_eq!(path.to_string(), "Search.search<User>");
    }
}
