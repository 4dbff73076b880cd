//! The typed schema tree (spec.md §3): a sum type over schema kinds,
//! built from a value tree by [`crate::build::build_schema`].

use std::rc::Rc;

use kson_diagnostics::Location;
use serde_json::Value as JsonValue;

/// Every schema node is shared via `Rc` rather than owned uniquely: `$ref`
/// navigation and the ID index (spec.md §4.K: "`$ref` navigation returns
/// *references* into the original schema tree") both need to hand out
/// shared pointers into the same tree without cloning it.
pub type SchemaRef = Rc<SchemaNode>;

/// The JSON-Schema primitive type names (spec.md's `simpleTypes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Null,
    Boolean,
    Object,
    Array,
    Number,
    Integer,
    String,
}

impl PrimitiveType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

/// `additionalProperties` / `additionalItems`: tagged variants per
/// spec.md §3.
#[derive(Debug, Clone)]
pub enum AdditionalPolicy {
    Allowed,
    Forbidden,
    Schema(SchemaRef),
}

impl Default for AdditionalPolicy {
    fn default() -> Self {
        Self::Allowed
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumberConstraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct StringConstraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    /// The pattern source, uncompiled: per the design note in spec.md §9
    /// ("Pattern-property regex compilation"), compilation is deferred to
    /// the call site so navigation and validation can apply different
    /// failure policies.
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ArraySchema {
    pub items: Option<SchemaRef>,
    pub prefix_items: Vec<SchemaRef>,
    pub additional_items: AdditionalPolicy,
    pub contains: Option<SchemaRef>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    /// Whether `type: array` was explicit; implicit array schemas
    /// (`items`/`prefixItems`/`additionalItems`/`contains` with no
    /// `type`) set this to `false` (spec.md §4.I).
    pub enforce_type: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    /// Source-ordered so completion can offer properties in declaration
    /// order; lookups are a linear scan, which is fine at schema sizes.
    pub properties: Vec<(String, SchemaRef)>,
    pub pattern_properties: Vec<(String, SchemaRef)>,
    pub required: Vec<String>,
    pub additional_properties: AdditionalPolicy,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    /// Whether `type: object` was explicit (spec.md §4.I).
    pub enforce_type: bool,
}

impl ObjectSchema {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&SchemaRef> {
        self.properties.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// One entry of a `dependencies` keyword: either a schema dependency
/// (validated when the key is present) or a property dependency (a list
/// of sibling keys that must also be present).
#[derive(Debug, Clone)]
pub enum DependencyKind {
    Schema(SchemaRef),
    Property(Vec<String>),
}

/// The sum type over schema kinds (spec.md §3).
#[derive(Debug, Clone)]
pub enum SchemaKind {
    Null,
    Boolean,
    Number(NumberConstraints),
    Integer(NumberConstraints),
    String(StringConstraints),
    Array(ArraySchema),
    Object(ObjectSchema),
    Const(JsonValue),
    Enum(Vec<JsonValue>),
    /// A schema boolean `true`: everything validates.
    True,
    /// A schema boolean `false`: nothing validates.
    False,
    /// No `type` and no other type-implying keyword: annotations only.
    Universal,
    MultipleType(Vec<PrimitiveType>),
    AllOf(Vec<SchemaRef>),
    AnyOf(Vec<SchemaRef>),
    OneOf(Vec<SchemaRef>),
    Not(SchemaRef),
    IfThenElse {
        if_: SchemaRef,
        then: Option<SchemaRef>,
        else_: Option<SchemaRef>,
    },
    Ref(String),
    Dependencies(Vec<(String, DependencyKind)>),
    PropertyNames(SchemaRef),
}

/// Metadata common to every schema node, carried regardless of kind
/// (spec.md §9 "Polymorphism by capability": every `JsonSchema` variant
/// shares a tuple of `title`, `description`, `default`, `definitions`).
#[derive(Debug, Clone, Default)]
pub struct SchemaMeta {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<JsonValue>,
    pub deprecated: bool,
    /// `$defs`/`definitions`, kept for ID-index seeding and document
    /// navigation; not consulted by validation directly.
    pub definitions: Vec<(String, SchemaRef)>,
}

#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub location: Location,
    pub meta: SchemaMeta,
    pub kind: SchemaKind,
}

impl SchemaNode {
    #[must_use]
    pub fn new(location: Location, meta: SchemaMeta, kind: SchemaKind) -> SchemaRef {
        Rc::new(Self { location, meta, kind })
    }

    #[must_use]
    pub fn universal(location: Location) -> SchemaRef {
        Self::new(location, SchemaMeta::default(), SchemaKind::Universal)
    }

    /// Whether this node is a combinator (spec.md §3 invariant: "Every
    /// combinator node holds a non-empty list of subschemas").
    #[must_use]
    pub fn is_combinator(&self) -> bool {
        matches!(
            self.kind,
            SchemaKind::AllOf(_) | SchemaKind::AnyOf(_) | SchemaKind::OneOf(_)
        )
    }

    /// The declared type name(s) for hover/completion purposes, without
    /// resolving `$ref` or descending into combinators.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        match &self.kind {
            SchemaKind::Null => vec!["null"],
            SchemaKind::Boolean => vec!["boolean"],
            SchemaKind::Number(_) => vec!["number"],
            SchemaKind::Integer(_) => vec!["integer"],
            SchemaKind::String(_) => vec!["string"],
            SchemaKind::Array(_) => vec!["array"],
            SchemaKind::Object(_) => vec!["object"],
            SchemaKind::MultipleType(types) => types.iter().map(|t| t.as_str()).collect(),
            SchemaKind::True | SchemaKind::False | SchemaKind::Universal => vec![],
            SchemaKind::Const(_) | SchemaKind::Enum(_) => vec![],
            _ => vec![],
        }
    }
}
