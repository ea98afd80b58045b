//! Schema Type Index: named-type lookup, field lookup, possible types and
//! leaf classification over a validated schema.

use crate::{extract_type_def, OperationType, TypeDef, TypeDefKind, TypeRef};
use apollo_compiler::collections::IndexMap;
use apollo_compiler::Schema;
use std::sync::Arc;

/// Name of the typename meta-field, legal on every composite type.
pub const TYPENAME_FIELD: &str = "__typename";

const SCHEMA_FIELD: &str = "__schema";
const TYPE_FIELD: &str = "__type";

/// A resolved schema type: its kind and named type, plus the list/non-null
/// wrappers that were peeled off to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaTypeRef {
    pub kind: TypeDefKind,
    pub ty: TypeRef,
}

impl SchemaTypeRef {
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.ty.name
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.ty.dimensions()
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }
}

/// A field looked up on an object or interface type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    /// The type the field was looked up on
    pub parent: Arc<str>,
    pub name: Arc<str>,
    pub ty: SchemaTypeRef,
}

/// Queryable type information for one schema.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    types: IndexMap<Arc<str>, TypeDef>,
    possible_types: IndexMap<Arc<str>, Vec<Arc<str>>>,
    query_root: Option<Arc<str>>,
    mutation_root: Option<Arc<str>>,
    subscription_root: Option<Arc<str>>,
}

impl SchemaIndex {
    #[must_use]
    #[tracing::instrument(skip(schema), fields(types = schema.types.len()))]
    pub fn new(schema: &Schema) -> Self {
        let mut types = IndexMap::default();
        for (name, ty) in &schema.types {
            let type_def = extract_type_def(name.as_str(), ty);
            types.insert(type_def.name.clone(), type_def);
        }

        let possible_types = compute_possible_types(&types);

        let root = |component: Option<&apollo_compiler::schema::ComponentName>| {
            component.map(|c| Arc::<str>::from(c.name.as_str()))
        };
        let definition = &schema.schema_definition;

        tracing::debug!(types = types.len(), "Built schema index");

        Self {
            types,
            possible_types,
            query_root: root(definition.query.as_ref()),
            mutation_root: root(definition.mutation.as_ref()),
            subscription_root: root(definition.subscription.as_ref()),
        }
    }

    /// Look up a named type.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<TypeDefKind> {
        self.get(name).map(|t| t.kind)
    }

    /// A bare (unwrapped, nullable) reference to a named type.
    #[must_use]
    pub fn named_type(&self, name: &str) -> Option<SchemaTypeRef> {
        self.resolve_named_type(&TypeRef::named(name, false))
    }

    /// Resolve the named type under a wrapped type reference.
    ///
    /// Returns `None` only if the named type isn't in the schema, which can't
    /// happen for types taken from a validated schema.
    #[must_use]
    pub fn resolve_named_type(&self, ty: &TypeRef) -> Option<SchemaTypeRef> {
        let type_def = self.get(&ty.name)?;
        Some(SchemaTypeRef {
            kind: type_def.kind,
            ty: TypeRef {
                name: type_def.name.clone(),
                list_non_null: ty.list_non_null.clone(),
                is_non_null: ty.is_non_null,
            },
        })
    }

    /// Look up a field on an object, interface or union type.
    ///
    /// `__typename` resolves on every composite type. `__schema` and `__type`
    /// resolve only on the query root type. Any other field must be declared
    /// on the type itself; unions declare none.
    #[must_use]
    pub fn field_of(&self, type_name: &str, field_name: &str) -> Option<FieldDef> {
        let type_def = self.get(type_name)?;
        if !type_def.kind.is_composite() {
            return None;
        }

        let meta = |ty: TypeRef| {
            Some(FieldDef {
                parent: type_def.name.clone(),
                name: Arc::from(field_name),
                ty: self.resolve_named_type(&ty)?,
            })
        };

        match field_name {
            TYPENAME_FIELD => meta(TypeRef::named("String", true)),
            SCHEMA_FIELD if self.is_query_root(type_name) => meta(TypeRef::named("__Schema", true)),
            TYPE_FIELD if self.is_query_root(type_name) => meta(TypeRef::named("__Type", false)),
            _ => {
                let field = type_def.field(field_name)?;
                Some(FieldDef {
                    parent: type_def.name.clone(),
                    name: field.name.clone(),
                    ty: self.resolve_named_type(&field.type_ref)?,
                })
            }
        }
    }

    /// Concrete object types a value of `type_name` can be.
    ///
    /// An object type's only possible type is itself. Interfaces list their
    /// implementing objects in schema order; unions list their members in
    /// declaration order. Leaf and unknown types have none.
    #[must_use]
    pub fn possible_types_of(&self, type_name: &str) -> &[Arc<str>] {
        self.possible_types
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True for scalars and enums.
    #[must_use]
    pub fn is_leaf_type(&self, type_name: &str) -> bool {
        self.kind_of(type_name).is_some_and(TypeDefKind::is_leaf)
    }

    #[must_use]
    pub fn is_abstract_type(&self, type_name: &str) -> bool {
        self.kind_of(type_name)
            .is_some_and(TypeDefKind::is_abstract)
    }

    /// The root type for an operation type, if the schema defines one.
    #[must_use]
    pub fn root_type(&self, operation_type: OperationType) -> Option<&Arc<str>> {
        match operation_type {
            OperationType::Query => self.query_root.as_ref(),
            OperationType::Mutation => self.mutation_root.as_ref(),
            OperationType::Subscription => self.subscription_root.as_ref(),
        }
    }

    /// True if `type_name` is the root type of any operation type.
    #[must_use]
    pub fn is_root_type(&self, type_name: &str) -> bool {
        [
            &self.query_root,
            &self.mutation_root,
            &self.subscription_root,
        ]
        .into_iter()
        .flatten()
        .any(|root| root.as_ref() == type_name)
    }

    fn is_query_root(&self, type_name: &str) -> bool {
        self.query_root
            .as_ref()
            .is_some_and(|root| root.as_ref() == type_name)
    }
}

fn compute_possible_types(
    types: &IndexMap<Arc<str>, TypeDef>,
) -> IndexMap<Arc<str>, Vec<Arc<str>>> {
    let mut possible: IndexMap<Arc<str>, Vec<Arc<str>>> = IndexMap::default();

    for type_def in types.values() {
        match type_def.kind {
            TypeDefKind::Object => {
                possible
                    .entry(type_def.name.clone())
                    .or_default()
                    .push(type_def.name.clone());
                for iface in &type_def.implements {
                    possible
                        .entry(iface.clone())
                        .or_default()
                        .push(type_def.name.clone());
                }
            }
            TypeDefKind::Interface => {
                possible.entry(type_def.name.clone()).or_default();
            }
            TypeDefKind::Union => {
                let members = type_def
                    .union_members
                    .iter()
                    .filter(|m| types.get(m.as_ref()).is_some_and(|t| t.kind == TypeDefKind::Object))
                    .cloned()
                    .collect();
                possible.insert(type_def.name.clone(), members);
            }
            _ => {}
        }
    }

    possible
}
