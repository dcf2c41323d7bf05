#![forbid(unsafe_code)]
//! Backlot model SSOT.
//!
//! Every shape that crosses a boundary lives here: the validated address
//! and contact newtypes, the submission form, the server-authoritative
//! lead record, and the client-side mirror snapshot. Wire names match the
//! hosted `property_submissions` table columns.

mod address;
mod lead;
mod mirror;
pub mod serde_helpers;

pub use address::{
    address_mentions_served_state, format_address, ParseError, PostalAddress, StateCode, ZipCode,
    SERVED_STATE_CODE, STATE_CODE_LEN, ZIP_CODE_LEN,
};
pub use lead::{
    EmailAddress, LeadId, LeadRecord, LeadSubmission, NewLead, PropertyAttributes,
    ValidatedSubmission, ValidationError,
};
pub use mirror::MirrorSnapshot;

pub const CRATE_NAME: &str = "backlot-model";
