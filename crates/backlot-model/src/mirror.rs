// SPDX-License-Identifier: Apache-2.0

use crate::address::{address_mentions_served_state, StateCode};
use crate::lead::ValidatedSubmission;
use serde::{Deserialize, Serialize};

/// Denormalized snapshot of the last submitted form, plus the server-issued
/// identifier once known.
///
/// Written to both local slots at submission time, overwritten by each new
/// submission, read only as a fallback, never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    pub address: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub saved_at_ms: u64,
}

impl MirrorSnapshot {
    #[must_use]
    pub fn from_submission(submission: &ValidatedSubmission, saved_at_ms: u64) -> Self {
        let (street, city, state, zip_code) = match &submission.components {
            Some(addr) => (
                addr.street.clone(),
                addr.city.clone(),
                addr.state.as_str().to_string(),
                addr.zip.as_str().to_string(),
            ),
            None => (
                String::new(),
                String::new(),
                submission
                    .state
                    .as_ref()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                String::new(),
            ),
        };
        Self {
            address: submission.address.clone(),
            street,
            city,
            state,
            zip_code,
            first_name: submission.first_name.clone(),
            last_name: submission.last_name.clone(),
            email: submission.email.as_str().to_string(),
            lead_id: None,
            saved_at_ms,
        }
    }

    /// Served-region gate for a snapshot-backed render, derived the same
    /// way the submission client derives it.
    #[must_use]
    pub fn service_available(&self) -> bool {
        match StateCode::parse(&self.state) {
            Ok(state) => state.is_served(),
            Err(_) => address_mentions_served_state(&self.address),
        }
    }
}
