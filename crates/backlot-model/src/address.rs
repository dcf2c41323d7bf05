// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const STATE_CODE_LEN: usize = 2;
pub const ZIP_CODE_LEN: usize = 5;

/// The sole state the business currently serves.
pub const SERVED_STATE_CODE: &str = "MA";

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    InvalidFormat(&'static str, &'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(field) => write!(f, "{field} must not be empty"),
            Self::Trimmed(field) => {
                write!(f, "{field} must not contain leading/trailing whitespace")
            }
            Self::InvalidFormat(field, requirement) => write!(f, "{field} {requirement}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Two-letter USPS state code, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct StateCode(String);

impl StateCode {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ParseError::Empty("state"));
        }
        if s.len() != STATE_CODE_LEN || !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ParseError::InvalidFormat(
                "state",
                "must be exactly two letters (e.g. MA)",
            ));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this state falls inside the served region.
    #[must_use]
    pub fn is_served(&self) -> bool {
        self.0 == SERVED_STATE_CODE
    }
}

impl Display for StateCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Five-digit ZIP code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ParseError::Empty("zip"));
        }
        if s.len() != ZIP_CODE_LEN || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::InvalidFormat(
                "zip",
                "must be exactly five digits",
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ZipCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully decomposed postal address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub state: StateCode,
    pub zip: ZipCode,
}

impl PostalAddress {
    pub fn parse(street: &str, city: &str, state: &str, zip: &str) -> Result<Self, ParseError> {
        let street = street.trim();
        if street.is_empty() {
            return Err(ParseError::Empty("street"));
        }
        let city = city.trim();
        if city.is_empty() {
            return Err(ParseError::Empty("city"));
        }
        Ok(Self {
            street: street.to_string(),
            city: city.to_string(),
            state: StateCode::parse(state)?,
            zip: ZipCode::parse(zip)?,
        })
    }

    /// The canonical single-line form: `street, city, STATE zip`.
    #[must_use]
    pub fn formatted(&self) -> String {
        format_address(
            &self.street,
            &self.city,
            self.state.as_str(),
            self.zip.as_str(),
        )
    }
}

impl Display for PostalAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

#[must_use]
pub fn format_address(street: &str, city: &str, state: &str, zip: &str) -> String {
    format!("{street}, {city}, {state} {zip}")
}

/// Heuristic for literal address strings with no decomposed state
/// component: a `", MA "` segment marks the served region.
#[must_use]
pub fn address_mentions_served_state(address: &str) -> bool {
    address
        .to_ascii_uppercase()
        .contains(&format!(", {SERVED_STATE_CODE} "))
}
