use apollo_compiler::ast;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Node;
use graphql_types::{FileId, OffsetRange};
use std::fmt;
use std::sync::Arc;

/// Structure of a schema type definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDef {
    pub name: Arc<str>,
    pub kind: TypeDefKind,
    pub fields: Vec<FieldSignature>,
    pub implements: Vec<Arc<str>>,
    pub union_members: Vec<Arc<str>>,
}

impl TypeDef {
    /// Find a declared field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSignature> {
        self.fields.iter().find(|f| f.name.as_ref() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TypeDefKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    InputObject,
}

impl TypeDefKind {
    /// Scalars and enums: selections on them take no sub-selection.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Scalar | Self::Enum)
    }

    /// Interfaces and unions.
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::Interface | Self::Union)
    }

    /// Types a selection set can be resolved against.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Object | Self::Interface | Self::Union)
    }
}

impl fmt::Display for TypeDefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Object => "OBJECT",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::Scalar => "SCALAR",
            Self::InputObject => "INPUT",
        };
        f.write_str(kind)
    }
}

/// Signature of a field (no resolver, no body)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSignature {
    pub name: Arc<str>,
    pub type_ref: TypeRef,
}

/// Reference to a type with its list/non-null wrappers peeled off.
///
/// `[[Int!]]!` is `name: Int`, `list_non_null: [true, false]`,
/// `is_non_null: true`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: Arc<str>,
    /// Non-null flag of each list level, outermost first
    pub list_non_null: Vec<bool>,
    /// Non-null flag of the named type itself
    pub is_non_null: bool,
}

impl TypeRef {
    /// A bare named type reference with no list wrapping.
    #[must_use]
    pub fn named(name: impl Into<Arc<str>>, is_non_null: bool) -> Self {
        Self {
            name: name.into(),
            list_non_null: Vec::new(),
            is_non_null,
        }
    }

    /// Number of list levels around the named type.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.list_non_null.len()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in &self.list_non_null {
            f.write_str("[")?;
        }
        f.write_str(&self.name)?;
        if self.is_non_null {
            f.write_str("!")?;
        }
        for non_null in self.list_non_null.iter().rev() {
            f.write_str("]")?;
            if *non_null {
                f.write_str("!")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    /// Suffix appended to operation type names (`FeedQuery`).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        }
    }
}

impl From<ast::OperationType> for OperationType {
    fn from(operation_type: ast::OperationType) -> Self {
        match operation_type {
            ast::OperationType::Query => Self::Query,
            ast::OperationType::Mutation => Self::Mutation,
            ast::OperationType::Subscription => Self::Subscription,
        }
    }
}

/// An operation definition with its position in the document
#[derive(Debug, Clone)]
pub struct OperationStructure {
    pub name: Option<Arc<str>>,
    pub operation_type: OperationType,
    pub file_id: FileId,
    /// The range of the entire operation
    pub operation_range: OffsetRange,
    pub node: Node<ast::OperationDefinition>,
}

/// A fragment definition with its position in the document
#[derive(Debug, Clone)]
pub struct FragmentStructure {
    pub name: Arc<str>,
    pub type_condition: Arc<str>,
    pub file_id: FileId,
    /// The range of the entire fragment definition
    pub fragment_range: OffsetRange,
    pub node: Node<ast::FragmentDefinition>,
}

/// An operation or fragment definition
#[derive(Debug, Clone)]
pub enum ExecutableDefinition {
    Operation(OperationStructure),
    Fragment(FragmentStructure),
}

/// Executable definitions of one file, in source order.
#[derive(Debug, Clone)]
pub struct FileStructureData {
    pub file_id: FileId,
    pub definitions: Vec<ExecutableDefinition>,
}

impl FileStructureData {
    pub fn operations(&self) -> impl Iterator<Item = &OperationStructure> {
        self.definitions.iter().filter_map(|def| match def {
            ExecutableDefinition::Operation(op) => Some(op),
            ExecutableDefinition::Fragment(_) => None,
        })
    }

    pub fn fragments(&self) -> impl Iterator<Item = &FragmentStructure> {
        self.definitions.iter().filter_map(|def| match def {
            ExecutableDefinition::Fragment(frag) => Some(frag),
            ExecutableDefinition::Operation(_) => None,
        })
    }
}

/// Extract an [`OffsetRange`] from an apollo-compiler `Node`
#[must_use]
pub fn node_range<T>(node: &Node<T>) -> OffsetRange {
    node.location()
        .map(|loc| OffsetRange::new(loc.offset(), loc.end_offset()))
        .unwrap_or_default()
}

/// Extract operations and fragments from a parsed document.
/// Schema definitions in the document are ignored.
#[must_use]
pub fn file_structure(file_id: FileId, document: &ast::Document) -> FileStructureData {
    let mut definitions = Vec::new();

    for definition in &document.definitions {
        match definition {
            ast::Definition::OperationDefinition(op) => {
                definitions.push(ExecutableDefinition::Operation(
                    extract_operation_structure(op, file_id),
                ));
            }
            ast::Definition::FragmentDefinition(frag) => {
                definitions.push(ExecutableDefinition::Fragment(
                    extract_fragment_structure(frag, file_id),
                ));
            }
            _ => {}
        }
    }

    FileStructureData {
        file_id,
        definitions,
    }
}

fn extract_operation_structure(
    op: &Node<ast::OperationDefinition>,
    file_id: FileId,
) -> OperationStructure {
    OperationStructure {
        name: op.name.as_ref().map(|n| Arc::from(n.as_str())),
        operation_type: op.operation_type.into(),
        file_id,
        operation_range: node_range(op),
        node: op.clone(),
    }
}

fn extract_fragment_structure(
    frag: &Node<ast::FragmentDefinition>,
    file_id: FileId,
) -> FragmentStructure {
    FragmentStructure {
        name: Arc::from(frag.name.as_str()),
        type_condition: Arc::from(frag.type_condition.as_str()),
        file_id,
        fragment_range: node_range(frag),
        node: frag.clone(),
    }
}

/// Extract a [`TypeDef`] from a schema type.
#[must_use]
pub fn extract_type_def(name: &str, ty: &ExtendedType) -> TypeDef {
    let mut type_def = TypeDef {
        name: Arc::from(name),
        kind: TypeDefKind::Scalar,
        fields: Vec::new(),
        implements: Vec::new(),
        union_members: Vec::new(),
    };

    match ty {
        ExtendedType::Scalar(_) => {}
        ExtendedType::Object(obj) => {
            type_def.kind = TypeDefKind::Object;
            type_def.fields = obj
                .fields
                .values()
                .map(|f| extract_field_signature(f))
                .collect();
            type_def.implements = obj
                .implements_interfaces
                .iter()
                .map(|i| Arc::from(i.name.as_str()))
                .collect();
        }
        ExtendedType::Interface(iface) => {
            type_def.kind = TypeDefKind::Interface;
            type_def.fields = iface
                .fields
                .values()
                .map(|f| extract_field_signature(f))
                .collect();
            type_def.implements = iface
                .implements_interfaces
                .iter()
                .map(|i| Arc::from(i.name.as_str()))
                .collect();
        }
        ExtendedType::Union(union_def) => {
            type_def.kind = TypeDefKind::Union;
            type_def.union_members = union_def
                .members
                .iter()
                .map(|m| Arc::from(m.name.as_str()))
                .collect();
        }
        ExtendedType::Enum(_) => type_def.kind = TypeDefKind::Enum,
        ExtendedType::InputObject(input) => {
            type_def.kind = TypeDefKind::InputObject;
            type_def.fields = input
                .fields
                .iter()
                .map(|(name, f)| FieldSignature {
                    name: Arc::from(name.as_str()),
                    type_ref: extract_type_ref(&f.ty),
                })
                .collect();
        }
    }

    type_def
}

fn extract_field_signature(field: &ast::FieldDefinition) -> FieldSignature {
    FieldSignature {
        name: Arc::from(field.name.as_str()),
        type_ref: extract_type_ref(&field.ty),
    }
}

/// Peel list and non-null wrappers off an AST type.
#[must_use]
pub fn extract_type_ref(ty: &ast::Type) -> TypeRef {
    let mut list_non_null = Vec::new();
    let mut current = ty;

    loop {
        match current {
            ast::Type::Named(name) => {
                return TypeRef {
                    name: Arc::from(name.as_str()),
                    list_non_null,
                    is_non_null: false,
                };
            }
            ast::Type::NonNullNamed(name) => {
                return TypeRef {
                    name: Arc::from(name.as_str()),
                    list_non_null,
                    is_non_null: true,
                };
            }
            ast::Type::List(inner) => {
                list_non_null.push(false);
                current = &**inner;
            }
            ast::Type::NonNullList(inner) => {
                list_non_null.push(true);
                current = &**inner;
            }
        }
    }
}

/// Directives on a selection that change the shape of its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SelectionDirectives {
    /// `@skip` or `@include` whose condition isn't a literal "always include"
    pub conditional: bool,
    /// `@defer`, unless `if: false`
    pub deferred: bool,
    /// `@unmask`: always expand this spread's fields
    pub unmask: bool,
}

impl SelectionDirectives {
    #[must_use]
    pub fn from_ast(directives: &ast::DirectiveList) -> Self {
        let mut result = Self::default();
        for directive in directives.iter() {
            let literal_if = directive
                .arguments
                .iter()
                .find(|arg| arg.name.as_str() == "if")
                .and_then(|arg| match *arg.value {
                    ast::Value::Boolean(value) => Some(value),
                    _ => None,
                });

            match directive.name.as_str() {
                "skip" => result.conditional |= literal_if != Some(false),
                "include" => result.conditional |= literal_if != Some(true),
                "defer" => result.deferred |= literal_if != Some(false),
                "unmask" => result.unmask = true,
                _ => {}
            }
        }
        result
    }
}
