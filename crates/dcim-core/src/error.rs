//! Core error types.
//!
//! Validation produces a field-keyed [`ValidationErrors`] set so a form layer
//! can attach each message to the input it concerns. The service turns a
//! non-empty set into one [`DcimError`] carrying the whole set.

use dcim_store::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Key for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "__all__";

/// What kind of rule a validation error comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// Rack space, face, height or subdevice-role rules
    Placement,
    /// Cross-entity consistency (site, location, platform, IP ownership)
    Referential,
    /// A mutation would break an invariant held by existing records
    Structural,
}

/// One validation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub category: ErrorCategory,
    pub message: String,
    /// Ids of the records that cause the error, when there are any
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<u64>,
}

/// Validation errors keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<FieldError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, category: ErrorCategory, message: impl Into<String>) {
        self.add_with_objects(field, category, message, Vec::new());
    }

    pub fn add_with_objects(
        &mut self,
        field: &str,
        category: ErrorCategory,
        message: impl Into<String>,
        objects: Vec<u64>,
    ) {
        self.errors.entry(field.to_string()).or_default().push(FieldError {
            category,
            message: message.into(),
            objects,
        });
    }

    pub fn placement(&mut self, field: &str, message: impl Into<String>) {
        self.add(field, ErrorCategory::Placement, message);
    }

    pub fn referential(&mut self, field: &str, message: impl Into<String>) {
        self.add(field, ErrorCategory::Referential, message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of messages across all fields
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn get(&self, field: &str) -> &[FieldError] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn messages(&self, field: &str) -> Vec<&str> {
        self.get(field).iter().map(|e| e.message.as_str()).collect()
    }

    pub fn has_category(&self, category: ErrorCategory) -> bool {
        self.errors.values().flatten().any(|e| e.category == category)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, errors) in other.errors {
            self.errors.entry(field).or_default().extend(errors);
        }
    }

    /// `Ok` when empty; otherwise the most severe category decides the error
    pub fn into_result(self) -> Result<(), DcimError> {
        if self.is_empty() {
            return Ok(());
        }
        if self.has_category(ErrorCategory::Structural) {
            let structural: Vec<&FieldError> = self
                .errors
                .values()
                .flatten()
                .filter(|e| e.category == ErrorCategory::Structural)
                .collect();
            let message = structural
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            let objects = structural.iter().flat_map(|e| e.objects.iter().copied()).collect();
            return Err(DcimError::StructuralInvariantViolation { message, objects });
        }
        if self.has_category(ErrorCategory::Placement) {
            return Err(DcimError::PlacementConflict(self));
        }
        Err(DcimError::ReferentialMismatch(self))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, errors) in &self.errors {
            for error in errors {
                if !first {
                    write!(f, "; ")?;
                }
                first = false;
                write!(f, "{}: {}", field, error.message)?;
            }
        }
        Ok(())
    }
}

/// Errors returned by core operations
#[derive(Debug, Error)]
pub enum DcimError {
    /// Rack space, face, height or subdevice-role rules violated
    #[error("Placement conflict: {0}")]
    PlacementConflict(ValidationErrors),

    /// Cross-entity consistency violated
    #[error("Referential mismatch: {0}")]
    ReferentialMismatch(ValidationErrors),

    /// The store rejected a write; retry with different input
    #[error("Integrity constraint violation: {0}")]
    IntegrityConstraintViolation(String),

    /// The mutation is blocked until the listed objects change
    #[error("Structural invariant violation: {message}")]
    StructuralInvariantViolation { message: String, objects: Vec<u64> },

    /// Referenced record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A template name or template reference cannot be resolved
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store failure unrelated to the data
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DcimError {
    /// The field errors behind a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            DcimError::PlacementConflict(errors) | DcimError::ReferentialMismatch(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<StoreError> for DcimError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::IntegrityViolation(message) => DcimError::IntegrityConstraintViolation(message),
            StoreError::NotFound(message) => DcimError::NotFound(message),
            other => DcimError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_wins_over_referential() {
        let mut errors = ValidationErrors::new();
        errors.referential("rack", "Rack R1 does not belong to site dc2.");
        errors.placement("position", "U10 is already occupied");
        assert_eq!(errors.len(), 2);

        match errors.into_result() {
            Err(DcimError::PlacementConflict(errors)) => {
                assert!(errors.contains("rack"), "every field error is kept");
                assert!(errors.contains("position"));
            }
            other => panic!("expected placement conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_structural_collects_objects() {
        let mut errors = ValidationErrors::new();
        errors.add_with_objects("u_height", ErrorCategory::Structural, "no room", vec![4, 9]);
        match errors.into_result() {
            Err(DcimError::StructuralInvariantViolation { message, objects }) => {
                assert_eq!(message, "no room");
                assert_eq!(objects, vec![4, 9]);
            }
            other => panic!("expected structural violation, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_store_integrity_maps_to_constraint_violation() {
        let err: DcimError = StoreError::IntegrityViolation("slot taken".to_string()).into();
        assert!(matches!(err, DcimError::IntegrityConstraintViolation(_)));
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.referential("platform", "wrong vendor");
        errors.placement("face", "missing");
        assert_eq!(errors.to_string(), "face: missing; platform: wrong vendor");
    }
}
