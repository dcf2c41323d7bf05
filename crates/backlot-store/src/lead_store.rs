// SPDX-License-Identifier: Apache-2.0

use crate::error::StoreError;
use backlot_model::{LeadId, LeadRecord, NewLead};

/// The five operations the funnel needs from the hosted table.
///
/// Implementations are blocking; async surfaces wrap them in a blocking
/// task. No operation retries on its own; retry is a user action.
pub trait LeadStore: Send + Sync {
    /// Trivial read used to distinguish "store unreachable" from every
    /// other failure before attempting real work.
    fn check_connectivity(&self) -> Result<(), StoreError>;

    /// Inserts one row and returns it as the server materialized it,
    /// identifier included. No partial insert: any error means no row.
    fn insert_lead(&self, lead: &NewLead) -> Result<LeadRecord, StoreError>;

    /// Fetches the row with the given identifier. Missing row is
    /// `NotFound`, not an empty success.
    fn fetch_lead(&self, id: &LeadId) -> Result<LeadRecord, StoreError>;

    /// Returns the imagery reference of an existing row with this exact
    /// address, if any, so the submission client can avoid a redundant
    /// imagery call.
    fn find_satellite_image(&self, address: &str) -> Result<Option<String>, StoreError>;

    /// Deletes the row with the given identifier. Deleting an absent row
    /// is not an error.
    fn delete_lead(&self, id: &LeadId) -> Result<(), StoreError>;
}
