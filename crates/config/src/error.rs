//! Definition-time and validation-time error types.
//!
//! The two tiers stay separate: a [`DefinitionError`] means the data
//! definition itself is wrong and the schema must not be used, while a
//! [`ValidationError`] rejects one value tree and carries the path of the
//! offending value.

use confschema_core::ValueType;
use confschema_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Malformed data definition. Schema construction is aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Primitive type without a classification.
    UnknownType {
        /// Field carrying the type.
        field: String,
        /// Offending type name.
        type_name: String,
    },
    /// `validate` rule not applicable to the field's type.
    InvalidValidateTag {
        /// Field carrying the tag.
        field: String,
        /// Field type name.
        type_name: String,
        /// Offending rule.
        validate: String,
    },
    /// Two fields map to the same key, possibly through flattening.
    DuplicateField {
        /// Colliding key.
        field: String,
        /// Structure the collision happened in.
        structure: String,
    },
    /// `"devices"` collection whose element type lacks the device identity.
    MissingDeviceCapability {
        /// Collection field.
        field: String,
        /// Element structure.
        structure: String,
    },
}

impl DefinitionError {
    /// Stable error code for the envelope.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::UnknownType { .. } => "unknown_type",
            Self::InvalidValidateTag { .. } => "invalid_validate_tag",
            Self::DuplicateField { .. } => "duplicate_field",
            Self::MissingDeviceCapability { .. } => "missing_device_capability",
        };
        ErrorCode::new("schema", code)
    }
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType { field, type_name } => {
                write!(formatter, "unknown type '{type_name}' for config field {field}")
            },
            Self::InvalidValidateTag {
                field,
                type_name,
                validate,
            } => write!(
                formatter,
                "invalid validate '{validate}' tag on {field} (type {type_name})"
            ),
            Self::DuplicateField { field, structure } => write!(
                formatter,
                "duplicate field {field} in {structure}, ensure only one field has this name"
            ),
            Self::MissingDeviceCapability { field, structure } => write!(
                formatter,
                "device collection {field} uses {structure}, which does not embed BaseDeviceConfig"
            ),
        }
    }
}

impl std::error::Error for DefinitionError {}

impl From<DefinitionError> for ErrorEnvelope {
    fn from(error: DefinitionError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::invariant(code, message);

        match error {
            DefinitionError::UnknownType { field, type_name } => envelope
                .with_metadata("field", field)
                .with_metadata("type", type_name),
            DefinitionError::InvalidValidateTag {
                field,
                type_name,
                validate,
            } => envelope
                .with_metadata("field", field)
                .with_metadata("type", type_name)
                .with_metadata("validate", validate),
            DefinitionError::DuplicateField { field, structure }
            | DefinitionError::MissingDeviceCapability { field, structure } => envelope
                .with_metadata("field", field)
                .with_metadata("structure", structure),
        }
    }
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Structure key.
    Field(String),
    /// List position.
    Index(usize),
}

/// Location of a value inside a value tree, e.g. `devices[2].port`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// Path of the root value.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments from the root down.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if position == 0 => formatter.write_str(name)?,
                PathSegment::Field(name) => write!(formatter, ".{name}")?,
                PathSegment::Index(index) => write!(formatter, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Why a value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Strict validation without a schema node.
    SchemaNotDefined,
    /// Value representation does not fit the schema type.
    TypeMismatch {
        /// Schema type.
        expected: ValueType,
        /// Representation found (see `ConfigValue::kind_name`).
        actual: &'static str,
    },
    /// Number beyond the canonical integer range.
    IntegerOutOfRange {
        /// Value found, as written.
        value: String,
    },
    /// Port outside `0..=65535`.
    PortOutOfRange {
        /// Value found.
        value: i64,
    },
    /// Select value not among the options.
    InvalidSelectOption {
        /// Value found.
        value: String,
    },
    /// Key without schema node in strict mode.
    UnknownField {
        /// Offending key.
        name: String,
    },
    /// Rejected by the configured `UniqueIncHook`.
    UniqueIncRejected {
        /// Value found.
        value: i64,
        /// Reason given by the hook.
        reason: String,
    },
    /// Validation aborted by a panic.
    Internal {
        /// Panic message.
        message: String,
    },
}

impl ValidationErrorKind {
    const fn code(&self) -> &'static str {
        match self {
            Self::SchemaNotDefined => "schema_not_defined",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::IntegerOutOfRange { .. } => "integer_out_of_range",
            Self::PortOutOfRange { .. } => "port_out_of_range",
            Self::InvalidSelectOption { .. } => "invalid_select_option",
            Self::UnknownField { .. } => "unknown_field",
            Self::UniqueIncRejected { .. } => "unique_inc_rejected",
            Self::Internal { .. } => "internal",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaNotDefined => formatter.write_str("schema is not defined"),
            Self::TypeMismatch { expected, actual } => {
                let (subject, wanted) = mismatch_wording(*expected);
                write!(formatter, "{subject} is no {wanted}, but {actual}")
            },
            Self::IntegerOutOfRange { value } => {
                write!(formatter, "integer out of range, is {value}")
            },
            Self::PortOutOfRange { value } => write!(formatter, "port out of range, is {value}"),
            Self::InvalidSelectOption { value } => {
                write!(formatter, "invalid select option {value:?}")
            },
            Self::UnknownField { name } => {
                write!(formatter, "value {name} does not exist in schema")
            },
            Self::UniqueIncRejected { value, reason } => {
                write!(formatter, "unique_inc value {value} rejected: {reason}")
            },
            Self::Internal { message } => write!(formatter, "validation aborted: {message}"),
        }
    }
}

const fn mismatch_wording(expected: ValueType) -> (&'static str, &'static str) {
    match expected {
        ValueType::Integer => ("integer", "integertype"),
        ValueType::Port => ("port", "integertype"),
        ValueType::UniqueInc => ("unique_integer", "integertype"),
        ValueType::Float => ("float", "float"),
        ValueType::String => ("string", "string"),
        ValueType::Ip => ("ip", "string"),
        ValueType::Password => ("password", "string"),
        ValueType::Select => ("select", "string"),
        ValueType::Checkbox => ("bool", "bool"),
        ValueType::Structure => ("structure", "object"),
        ValueType::Array => ("array", "array"),
        ValueType::StructureArray => ("structured array", "array"),
        ValueType::Unknown => ("value", "known type"),
    }
}

/// Rejected value tree, with the location of the offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Location of the offending value.
    pub path: FieldPath,
    /// Failure reason.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Error at `path`.
    #[must_use]
    pub const fn new(path: FieldPath, kind: ValidationErrorKind) -> Self {
        Self { path, kind }
    }

    /// Stable error code for the envelope.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::new("validation", self.kind.code())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(formatter, "{}", self.kind)
        } else {
            write!(formatter, "on validating {}: {}", self.path, self.kind)
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ErrorEnvelope {
    fn from(error: ValidationError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = match error.kind {
            ValidationErrorKind::Internal { .. } => Self::unexpected(code, message),
            _ => Self::expected(code, message),
        };
        envelope.with_metadata("path", error.path.to_string())
    }
}
