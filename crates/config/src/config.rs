use serde::{Deserialize, Serialize};

/// Default nesting limit for selection sets.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default suffix appended to fragment type names.
pub const DEFAULT_FRAGMENT_SUFFIX: &str = "Fragment";

/// Configuration for one resolution run.
///
/// Every key is optional; a missing key takes the default shown on the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct CodegenConfig {
    /// Inline fragment spreads while walking instead of in a second pass.
    pub flatten_fragments: bool,

    /// What the resolver pass does with spreads the walker left behind.
    pub fragment_mode: FragmentMode,

    /// Case conversion applied to generated identifiers.
    pub naming_convention: NamingConvention,

    /// When `false`, each `_`-separated part of a name is converted on its own
    /// and the underscores are kept.
    pub transform_underscore: bool,

    pub types_prefix: String,
    pub types_suffix: String,

    /// Drop the `Query`/`Mutation`/`Subscription` suffix from operation names.
    pub omit_operation_suffix: bool,

    /// Only append the operation suffix when the name doesn't already end with it.
    pub dedupe_operation_suffix: bool,

    pub fragment_suffix: String,

    /// Synthesize a `__typename` field on every object shape.
    pub add_typename: bool,

    /// Synthesized `__typename` fields are non-optional.
    pub non_optional_typename: bool,

    /// Never synthesize `__typename` on operation root shapes.
    pub skip_typename_for_root: bool,

    /// Maximum selection set nesting before resolution fails.
    pub max_depth: usize,

    /// Fragments defined outside the documents being generated.
    pub external_fragments: Vec<ExternalFragmentConfig>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            flatten_fragments: false,
            fragment_mode: FragmentMode::default(),
            naming_convention: NamingConvention::default(),
            transform_underscore: false,
            types_prefix: String::new(),
            types_suffix: String::new(),
            omit_operation_suffix: false,
            dedupe_operation_suffix: false,
            fragment_suffix: DEFAULT_FRAGMENT_SUFFIX.to_string(),
            add_typename: false,
            non_optional_typename: false,
            skip_typename_for_root: false,
            max_depth: DEFAULT_MAX_DEPTH,
            external_fragments: Vec::new(),
        }
    }
}

impl CodegenConfig {
    /// Returns `true` if spreads resolve to opaque references. Masked spreads
    /// are left for the resolver pass even in flatten mode.
    #[must_use]
    pub const fn masks_spreads(&self) -> bool {
        matches!(self.fragment_mode, FragmentMode::Mask)
    }
}

/// How fragment spreads surface in resolved shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentMode {
    /// Expand the fragment's fields into the spreading shape
    #[default]
    Inline,
    /// Keep a named reference to the fragment's shape
    Combine,
    /// Keep only an opaque reference; the fragment's fields are not visible
    Mask,
}

/// Case conversion for generated identifiers.
///
/// Unknown names deserialize to [`NamingConvention::PascalCase`] with a
/// warning rather than failing the whole config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NamingConvention {
    #[default]
    PascalCase,
    CamelCase,
    ConstantCase,
    SnakeCase,
    /// Leave names untouched
    Keep,
}

impl NamingConvention {
    /// Parse a convention name as it appears in config files.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "pascalCase" | "change-case-all#pascalCase" => Some(Self::PascalCase),
            "camelCase" | "change-case-all#camelCase" => Some(Self::CamelCase),
            "constantCase" | "change-case-all#constantCase" => Some(Self::ConstantCase),
            "snakeCase" | "change-case-all#snakeCase" => Some(Self::SnakeCase),
            "keep" => Some(Self::Keep),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PascalCase => "pascalCase",
            Self::CamelCase => "camelCase",
            Self::ConstantCase => "constantCase",
            Self::SnakeCase => "snakeCase",
            Self::Keep => "keep",
        }
    }
}

impl From<String> for NamingConvention {
    fn from(name: String) -> Self {
        Self::parse(&name).unwrap_or_else(|| {
            tracing::warn!(convention = %name, "Unknown naming convention, using pascalCase");
            Self::PascalCase
        })
    }
}

impl From<NamingConvention> for String {
    fn from(convention: NamingConvention) -> Self {
        convention.as_str().to_string()
    }
}

/// A fragment made visible to the run without being generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalFragmentConfig {
    /// Fragment name as spread in documents
    pub name: String,
    /// The schema type the fragment applies to
    pub on_type: String,
    /// GraphQL source containing the fragment definition
    pub document: String,
}
