//! Declarative data-definition model.
//!
//! A configuration type describes itself as a [`StructDefinition`]: an ordered
//! list of fields, each with a [`FieldShape`] and a set of [`FieldTags`]. The
//! derive macro in `confschema-derive` generates these; they can also be
//! registered by hand with the builder methods below.

use std::collections::BTreeMap;
use std::fmt;

/// Tag keys understood by the schema builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagKey {
    /// Validation rule (`ip`, `password`, `port`, `unique_inc`).
    Validate,
    /// Help text.
    Description,
    /// Comma-separated select options.
    Options,
    /// Comma-separated dispatch tags.
    Dispatch,
    /// Presentation order (integer).
    Order,
    /// Default value, parsed per primitive type.
    Default,
    /// Display label.
    Label,
    /// Section headline.
    Headline,
    /// Required display hint.
    Required,
    /// Hidden display hint.
    Hidden,
    /// Comma-separated model ids the field is limited to.
    OnlyOnModel,
    /// Comma-separated model ids the field is excluded from.
    NotOnModel,
}

impl TagKey {
    /// Attribute spelling of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Description => "description",
            Self::Options => "options",
            Self::Dispatch => "dispatch",
            Self::Order => "order",
            Self::Default => "default",
            Self::Label => "label",
            Self::Headline => "headline",
            Self::Required => "required",
            Self::Hidden => "hidden",
            Self::OnlyOnModel => "only_on_model",
            Self::NotOnModel => "not_on_model",
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Metadata tags attached to one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTags(BTreeMap<TagKey, String>);

impl FieldTags {
    /// Empty tag set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set a tag value, replacing any previous one.
    pub fn set(&mut self, key: TagKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    /// Tag value; empty strings count as absent.
    #[must_use]
    pub fn get(&self, key: TagKey) -> Option<&str> {
        self.0
            .get(&key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Comma-separated tag split into its parts.
    #[must_use]
    pub fn list(&self, key: TagKey) -> Vec<String> {
        self.get(key)
            .map(|value| value.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Shape of a field's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// Primitive identified by its type name (`String`, `u16`, `bool`, ...).
    Primitive(&'static str),
    /// Nested structure.
    Struct(StructDefinition),
    /// Growable sequence.
    Slice(Box<FieldShape>),
    /// One level of optional indirection.
    Optional(Box<FieldShape>),
}

impl FieldShape {
    /// Sequence of `inner`.
    #[must_use]
    pub fn slice(inner: Self) -> Self {
        Self::Slice(Box::new(inner))
    }

    /// Optional `inner`.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Strip every level of optional indirection.
    #[must_use]
    pub fn deref_optional(&self) -> &Self {
        let mut shape = self;
        while let Self::Optional(inner) = shape {
            shape = inner;
        }
        shape
    }

    /// Human-readable type name, e.g. `Vec<u16>`.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Primitive(name) => (*name).to_string(),
            Self::Struct(definition) => definition.name.to_string(),
            Self::Slice(inner) => format!("Vec<{}>", inner.type_name()),
            Self::Optional(inner) => format!("Option<{}>", inner.type_name()),
        }
    }
}

/// One field of a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Key used in value trees.
    pub name: String,
    /// Type shape.
    pub shape: FieldShape,
    /// Metadata tags.
    pub tags: FieldTags,
    /// Whether the field's children are flattened into the parent.
    pub embedded: bool,
}

impl FieldDefinition {
    /// Regular field.
    pub fn new(name: impl Into<String>, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            shape,
            tags: FieldTags::new(),
            embedded: false,
        }
    }

    /// Embedded field whose children are flattened into the parent.
    pub fn embedded(name: impl Into<String>, shape: FieldShape) -> Self {
        Self {
            embedded: true,
            ..Self::new(name, shape)
        }
    }

    /// Attach a tag.
    #[must_use]
    pub fn tag(mut self, key: TagKey, value: impl Into<String>) -> Self {
        self.tags.set(key, value);
        self
    }

    /// Attach a `validate` tag.
    #[must_use]
    pub fn validate(self, rule: impl Into<String>) -> Self {
        self.tag(TagKey::Validate, rule)
    }

    /// Attach a `description` tag.
    #[must_use]
    pub fn description(self, text: impl Into<String>) -> Self {
        self.tag(TagKey::Description, text)
    }

    /// Attach an `options` tag.
    #[must_use]
    pub fn options(self, options: impl Into<String>) -> Self {
        self.tag(TagKey::Options, options)
    }

    /// Attach a `dispatch` tag.
    #[must_use]
    pub fn dispatch(self, dispatch: impl Into<String>) -> Self {
        self.tag(TagKey::Dispatch, dispatch)
    }

    /// Attach an `order` tag.
    #[must_use]
    pub fn order(self, order: impl Into<String>) -> Self {
        self.tag(TagKey::Order, order)
    }

    /// Attach a `default` tag.
    #[must_use]
    pub fn default_value(self, default: impl Into<String>) -> Self {
        self.tag(TagKey::Default, default)
    }

    /// Attach a `label` tag.
    #[must_use]
    pub fn label(self, label: impl Into<String>) -> Self {
        self.tag(TagKey::Label, label)
    }
}

/// Field list of a structure plus its declared capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDefinition {
    /// Type name, used in diagnostics.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<FieldDefinition>,
    /// Declares the device identity capability.
    pub device: bool,
}

impl StructDefinition {
    /// Empty definition.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            device: false,
        }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare the device identity capability.
    #[must_use]
    pub const fn with_device_capability(mut self) -> Self {
        self.device = true;
        self
    }

    /// Whether this structure, or any structure it embeds, is device-capable.
    #[must_use]
    pub fn is_device_capable(&self) -> bool {
        self.device
            || self.fields.iter().any(|field| {
                field.embedded
                    && matches!(
                        field.shape.deref_optional(),
                        FieldShape::Struct(inner) if inner.is_device_capable()
                    )
            })
    }
}

/// Types usable as configuration fields.
pub trait ConfigField {
    /// Shape of the type.
    fn shape() -> FieldShape;
}

/// Types that describe themselves as a structure of fields.
pub trait ConfigDefinition {
    /// Field list of the type.
    fn definition() -> StructDefinition;
}

macro_rules! primitive_fields {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl ConfigField for $ty {
                fn shape() -> FieldShape {
                    FieldShape::Primitive($name)
                }
            }
        )*
    };
}

primitive_fields! {
    String => "String",
    bool => "bool",
    f32 => "f32",
    f64 => "f64",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    // No classification exists for these; the builder rejects them.
    char => "char",
    i128 => "i128",
    u128 => "u128",
}

impl<T: ConfigField> ConfigField for Vec<T> {
    fn shape() -> FieldShape {
        FieldShape::slice(T::shape())
    }
}

impl<T: ConfigField> ConfigField for Option<T> {
    fn shape() -> FieldShape {
        FieldShape::optional(T::shape())
    }
}

impl<T: ConfigField> ConfigField for Box<T> {
    fn shape() -> FieldShape {
        T::shape()
    }
}
