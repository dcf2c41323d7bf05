// SPDX-License-Identifier: Apache-2.0

use crate::address::{ParseError, PostalAddress, StateCode, ZipCode};
use crate::serde_helpers;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .unwrap_or_else(|e| panic!("email pattern must compile: {e}"))
    })
}

/// Contact email, checked against the standard pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[non_exhaustive]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ParseError::Empty("email"));
        }
        if !email_pattern().is_match(s) {
            return Err(ParseError::InvalidFormat(
                "email",
                "must be a valid email address",
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque server-generated identifier.
///
/// The parse rejects the literal `undefined`/`null` strings that URL
/// plumbing produces when a query parameter went missing upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct LeadId(String);

impl LeadId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ParseError::Empty("submission id"));
        }
        if s.eq_ignore_ascii_case("undefined") || s.eq_ignore_ascii_case("null") {
            return Err(ParseError::InvalidFormat(
                "submission id",
                "is not a usable identifier",
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LeadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    MissingField(&'static str),
    InvalidField(ParseError),
    NoUsableAddress,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::InvalidField(err) => write!(f, "{err}"),
            Self::NoUsableAddress => write!(
                f,
                "no valid address provided; include either a complete address or all address components"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ParseError> for ValidationError {
    fn from(err: ParseError) -> Self {
        Self::InvalidField(err)
    }
}

/// Raw contact + address form, exactly as a caller hands it over.
///
/// Either `address` is supplied literally or all four components are; the
/// components are still validated for shape whenever present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl LeadSubmission {
    /// Pre-flight validation. Fails with a field-naming error before any
    /// network activity can happen.
    pub fn validate(&self) -> Result<ValidatedSubmission, ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::MissingField("first name"));
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::MissingField("last name"));
        }
        let email = EmailAddress::parse(&self.email)?;

        let state = match self.state.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(StateCode::parse(s)?),
            _ => None,
        };
        let zip = match self.zip_code.as_deref().map(str::trim) {
            Some(z) if !z.is_empty() => Some(ZipCode::parse(z)?),
            _ => None,
        };

        let components = match (
            self.street.as_deref().map(str::trim),
            self.city.as_deref().map(str::trim),
            &state,
            &zip,
        ) {
            (Some(street), Some(city), Some(st), Some(zp))
                if !street.is_empty() && !city.is_empty() =>
            {
                Some(PostalAddress {
                    street: street.to_string(),
                    city: city.to_string(),
                    state: st.clone(),
                    zip: zp.clone(),
                })
            }
            _ => None,
        };

        let address = match self.address.as_deref().map(str::trim) {
            Some(literal) if !literal.is_empty() => literal.to_string(),
            _ => match &components {
                Some(addr) => addr.formatted(),
                None => return Err(ValidationError::NoUsableAddress),
            },
        };

        Ok(ValidatedSubmission {
            address,
            components,
            state,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email,
        })
    }
}

/// A submission that passed pre-flight validation, with the full address
/// string assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub address: String,
    pub components: Option<PostalAddress>,
    pub state: Option<StateCode>,
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
}

impl ValidatedSubmission {
    /// Whether the submitted property falls inside the served region.
    #[must_use]
    pub fn service_available(&self) -> bool {
        match &self.state {
            Some(state) => state.is_served(),
            None => crate::address::address_mentions_served_state(&self.address),
        }
    }
}

/// Property/zoning attributes attached to a lead once analyzed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyAttributes {
    pub lot_size: Option<String>,
    pub zoning: Option<String>,
    pub allows_adu: bool,
    pub max_adu_size: Option<String>,
    pub setback_front: Option<String>,
    pub setback_back: Option<String>,
    pub setback_sides: Option<String>,
    pub additional_notes: Vec<String>,
}

/// Insert payload for the hosted table; the server mints `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLead {
    pub address: String,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub lot_size: Option<String>,
    pub zoning: Option<String>,
    pub allows_adu: bool,
    pub max_adu_size: Option<String>,
    pub setback_front: Option<String>,
    pub setback_back: Option<String>,
    pub setback_sides: Option<String>,
    pub additional_notes: Vec<String>,
    pub satellite_image_url: Option<String>,
    pub service_available: bool,
}

/// Server-authoritative lead record, one row of `property_submissions`.
///
/// Rows written before the analysis columns existed carry nulls there;
/// the defaults mirror what the presentation layer has always assumed
/// (`allows_adu` true, `service_available` false).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: LeadId,
    pub address: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub lot_size: Option<String>,
    #[serde(default)]
    pub zoning: Option<String>,
    #[serde(
        default = "serde_helpers::default_true",
        deserialize_with = "serde_helpers::bool_or_true"
    )]
    pub allows_adu: bool,
    #[serde(default)]
    pub max_adu_size: Option<String>,
    #[serde(default)]
    pub setback_front: Option<String>,
    #[serde(default)]
    pub setback_back: Option<String>,
    #[serde(default)]
    pub setback_sides: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::null_as_empty")]
    pub additional_notes: Vec<String>,
    #[serde(default)]
    pub satellite_image_url: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::bool_or_false")]
    pub service_available: bool,
    #[serde(default)]
    pub created_at: String,
}
