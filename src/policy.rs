//! Field Policy - which fields the operator may edit
//!
//! Mutability lives beside the record, not inside it. Generator-owned and
//! fixed-by-policy fields are read-only; the rest are free text.

use std::collections::HashMap;
use thiserror::Error;

use crate::record::FieldName;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field is read-only: {0}")]
    ReadOnly(FieldName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Editable,
    ReadOnly,
}

#[derive(Debug, Clone)]
pub struct FieldPolicy {
    rules: HashMap<FieldName, Mutability>,
}

impl FieldPolicy {
    /// Everything editable.
    pub fn permissive() -> Self {
        Self {
            rules: FieldName::ALL
                .iter()
                .map(|f| (*f, Mutability::Editable))
                .collect(),
        }
    }

    pub fn standard() -> Self {
        Self::permissive()
            .with(FieldName::SupplierName, Mutability::ReadOnly)
            .with(FieldName::HuNumber, Mutability::ReadOnly)
            .with(FieldName::DateCode, Mutability::ReadOnly)
            .with(FieldName::ExpiryDate, Mutability::ReadOnly)
            .with(FieldName::VendorCode, Mutability::ReadOnly)
    }

    pub fn with(mut self, field: FieldName, mutability: Mutability) -> Self {
        self.rules.insert(field, mutability);
        self
    }

    pub fn mutability(&self, field: FieldName) -> Mutability {
        self.rules
            .get(&field)
            .copied()
            .unwrap_or(Mutability::Editable)
    }

    pub fn check(&self, field: FieldName) -> Result<(), FieldError> {
        match self.mutability(field) {
            Mutability::Editable => Ok(()),
            Mutability::ReadOnly => Err(FieldError::ReadOnly(field)),
        }
    }
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
