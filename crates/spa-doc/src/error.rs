//! Error and warning types for parsing and validation.

use serde::Serialize;
use thiserror::Error;

/// Stable error codes reported by the parser and validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed XML.
    ParseError,
    /// Root element is not `spa`.
    InvalidRoot,
    /// Root `version` attribute absent.
    MissingVersion,
    /// A required attribute is absent from a recognized element.
    MissingAttribute,
    /// Attribute present but out of range or unrecognized.
    InvalidValue,
    /// Envelope in `defs` without an `id`.
    MissingId,
    /// A `#id` reference does not match any entry in `defs`.
    ReferenceUnresolved,
}

impl ErrorCode {
    /// Returns the stable code string (e.g. `"PARSE_ERROR"`).
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::InvalidRoot => "INVALID_ROOT",
            ErrorCode::MissingVersion => "MISSING_VERSION",
            ErrorCode::MissingAttribute => "MISSING_ATTRIBUTE",
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::MissingId => "MISSING_ID",
            ErrorCode::ReferenceUnresolved => "REFERENCE_UNRESOLVED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Stable warning codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// Unrecognized element tag.
    UnknownElement,
    /// Group with no sound children.
    EmptyGroup,
    /// Repeat expansion would exceed the safety limit; skipped at render.
    RepeatBound,
}

impl WarningCode {
    /// Returns the stable code string (e.g. `"UNKNOWN_ELEMENT"`).
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::UnknownElement => "UNKNOWN_ELEMENT",
            WarningCode::EmptyGroup => "EMPTY_GROUP",
            WarningCode::RepeatBound => "REPEAT_BOUND",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional element path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
    /// Path to the offending element, e.g. `"sequence[0].tone[1].freq"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional element path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of validating a document without rendering it.
///
/// Warnings never make a document invalid; `valid` is false only when at
/// least one error was recorded.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.valid = false;
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Fatal parse errors; the parser aborts on the first one.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Root element is not `spa`.
    #[error("root element must be 'spa', found '{found}'")]
    InvalidRoot { found: String },

    /// Root `version` attribute missing.
    #[error("root element is missing the 'version' attribute")]
    MissingVersion,

    /// Required attribute missing.
    #[error("element '{element}' is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// Attribute present but malformed or unrecognized.
    #[error("invalid value for '{attribute}' on '{element}': {message}")]
    InvalidValue {
        element: String,
        attribute: String,
        message: String,
    },

    /// Envelope definition without an `id`.
    #[error("envelope in 'defs' is missing the 'id' attribute")]
    MissingId,

    /// Envelope reference did not resolve.
    #[error("envelope reference '#{id}' does not match any entry in 'defs'")]
    UnresolvedReference { id: String },
}

impl ParseError {
    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::Xml(_) => ErrorCode::ParseError,
            ParseError::InvalidRoot { .. } => ErrorCode::InvalidRoot,
            ParseError::MissingVersion => ErrorCode::MissingVersion,
            ParseError::MissingAttribute { .. } => ErrorCode::MissingAttribute,
            ParseError::InvalidValue { .. } => ErrorCode::InvalidValue,
            ParseError::MissingId => ErrorCode::MissingId,
            ParseError::UnresolvedReference { .. } => ErrorCode::ReferenceUnresolved,
        }
    }

    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        ParseError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub(crate) fn invalid_value(element: &str, attribute: &str, message: impl Into<String>) -> Self {
        ParseError::InvalidValue {
            element: element.to_string(),
            attribute: attribute.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ErrorCode::ParseError.code(), "PARSE_ERROR");
        assert_eq!(ErrorCode::InvalidRoot.code(), "INVALID_ROOT");
        assert_eq!(ErrorCode::ReferenceUnresolved.code(), "REFERENCE_UNRESOLVED");
        assert_eq!(WarningCode::EmptyGroup.code(), "EMPTY_GROUP");
        assert_eq!(WarningCode::RepeatBound.code(), "REPEAT_BOUND");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::with_path(
            ErrorCode::InvalidValue,
            "freq must be positive",
            "tone[0].freq",
        );
        assert_eq!(
            err.to_string(),
            "INVALID_VALUE: freq must be positive (at tone[0].freq)"
        );
    }

    #[test]
    fn report_tracks_validity() {
        let mut report = ValidationReport::new();
        assert!(report.is_valid());

        report.add_warning(ValidationWarning::new(WarningCode::EmptyGroup, "empty"));
        assert!(report.is_valid());

        report.add_error(ValidationError::new(ErrorCode::MissingVersion, "missing"));
        assert!(!report.is_valid());
    }

    #[test]
    fn codes_serialize_as_strings() {
        let json = serde_json::to_string(&ErrorCode::MissingAttribute).unwrap();
        assert_eq!(json, "\"MISSING_ATTRIBUTE\"");
        let json = serde_json::to_string(&WarningCode::UnknownElement).unwrap();
        assert_eq!(json, "\"UNKNOWN_ELEMENT\"");
    }
}
