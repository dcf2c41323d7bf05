// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorKind {
    Connectivity,
    NotFound,
    Permission,
    Validation,
    Parse,
    Unknown,
}

impl StoreErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity_error",
            Self::NotFound => "not_found",
            Self::Permission => "permission_error",
            Self::Validation => "validation_error",
            Self::Parse => "parse_error",
            Self::Unknown => "unknown_error",
        }
    }
}

/// Closed error shape produced at the store boundary.
///
/// `wire` carries the raw code from the hosted side (`42P01`, `42501`,
/// `PGRST116`, ...) when one was present, so callers that need to
/// distinguish "table missing" from "policy missing" can do so without
/// string-matching the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
    pub wire: Option<String>,
}

impl StoreError {
    #[must_use]
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            wire: None,
        }
    }

    #[must_use]
    pub fn with_wire(kind: StoreErrorKind, message: impl Into<String>, wire: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            wire: Some(wire.into()),
        }
    }

    /// Whether the hosted side reported the lead table as absent.
    #[must_use]
    pub fn is_missing_table(&self) -> bool {
        self.wire.as_deref() == Some("42P01")
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}
