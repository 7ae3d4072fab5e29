use thiserror::Error;

use crate::spec::ValueKind;

/// Errors produced when a value is checked against an input spec.
#[derive(Debug, Error)]
pub enum ValidationError {
  /// A required input with no default was not supplied.
  #[error("missing required input: {input}")]
  MissingRequiredInput { input: String },

  /// The supplied value does not match the spec's kind.
  #[error("input '{input}' expects a {expected} value")]
  WrongKind { input: String, expected: ValueKind },

  /// A numeric value falls outside the inclusive range.
  #[error("input '{input}' value {value} is outside the range [{minimum}, {maximum}]")]
  OutOfRange {
    input: String,
    value: f64,
    minimum: f64,
    maximum: f64,
  },

  /// A file path does not end in one of the allowed extensions.
  #[error("input '{input}' path '{path}' must have one of the extensions: {allowed}")]
  UnsupportedExtension {
    input: String,
    path: String,
    allowed: String,
  },

  /// A value was supplied for an input the workflow does not declare.
  #[error("no input named '{input}' is declared by the workflow")]
  UnknownInput { input: String },
}

impl ValidationError {
  /// The name of the input the error is about.
  pub fn input(&self) -> &str {
    match self {
      ValidationError::MissingRequiredInput { input }
      | ValidationError::WrongKind { input, .. }
      | ValidationError::OutOfRange { input, .. }
      | ValidationError::UnsupportedExtension { input, .. }
      | ValidationError::UnknownInput { input } => input,
    }
  }
}
