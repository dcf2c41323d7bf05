// SPDX-License-Identifier: Apache-2.0

use crate::error::{StoreError, StoreErrorKind};
use crate::lead_store::LeadStore;
use backlot_model::{LeadId, LeadRecord, NewLead};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory stand-in for the hosted table, with failure toggles so the
/// fallback chain can be exercised without a network.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, LeadRecord>>,
    next_id: AtomicU64,
    pub fail_connectivity: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_insert: AtomicBool,
    pub insert_calls: AtomicU64,
    pub fetch_calls: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn unreachable_error() -> StoreError {
        StoreError::new(StoreErrorKind::Connectivity, "store unreachable (simulated)")
    }

    fn lock_rows(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, LeadRecord>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::new(StoreErrorKind::Unknown, "row table lock poisoned"))
    }

    /// Inserts a fully-formed row as-is, bypassing id minting.
    pub fn seed_row(&self, record: LeadRecord) -> LeadId {
        let id = record.id.clone();
        if let Ok(mut rows) = self.rows.lock() {
            rows.insert(id.as_str().to_string(), record);
        }
        id
    }

    /// Number of rows currently held.
    pub fn len(&self) -> usize {
        self.lock_rows().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LeadStore for MemoryStore {
    fn check_connectivity(&self) -> Result<(), StoreError> {
        if self.fail_connectivity.load(Ordering::Relaxed) {
            return Err(Self::unreachable_error());
        }
        Ok(())
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<LeadRecord, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_connectivity.load(Ordering::Relaxed) {
            return Err(Self::unreachable_error());
        }
        if self.fail_insert.load(Ordering::Relaxed) {
            return Err(StoreError::with_wire(
                StoreErrorKind::Permission,
                "the lead table doesn't exist; run `backlot setup` to provision the store",
                "42P01",
            ));
        }
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = LeadId::parse(&format!("lead-{n:06}"))
            .map_err(|e| StoreError::new(StoreErrorKind::Unknown, e.to_string()))?;
        let record = LeadRecord {
            id: id.clone(),
            address: lead.address.clone(),
            street: lead.street.clone(),
            city: lead.city.clone(),
            state: lead.state.clone(),
            zip_code: lead.zip_code.clone(),
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            lot_size: lead.lot_size.clone(),
            zoning: lead.zoning.clone(),
            allows_adu: lead.allows_adu,
            max_adu_size: lead.max_adu_size.clone(),
            setback_front: lead.setback_front.clone(),
            setback_back: lead.setback_back.clone(),
            setback_sides: lead.setback_sides.clone(),
            additional_notes: lead.additional_notes.clone(),
            satellite_image_url: lead.satellite_image_url.clone(),
            service_available: lead.service_available,
            created_at: format!("2026-01-01T00:00:{:02}Z", n % 60),
        };
        self.lock_rows()?.insert(id.as_str().to_string(), record.clone());
        Ok(record)
    }

    fn fetch_lead(&self, id: &LeadId) -> Result<LeadRecord, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_connectivity.load(Ordering::Relaxed) {
            return Err(Self::unreachable_error());
        }
        if self.fail_fetch.load(Ordering::Relaxed) {
            return Err(StoreError::new(
                StoreErrorKind::Unknown,
                "fetch failed (simulated)",
            ));
        }
        self.lock_rows()?.get(id.as_str()).cloned().ok_or_else(|| {
            StoreError::new(
                StoreErrorKind::NotFound,
                format!("lead {id} not found; it may have been deleted or the id is incorrect"),
            )
        })
    }

    fn find_satellite_image(&self, address: &str) -> Result<Option<String>, StoreError> {
        if self.fail_connectivity.load(Ordering::Relaxed) {
            return Err(Self::unreachable_error());
        }
        Ok(self
            .lock_rows()?
            .values()
            .find(|row| row.address == address)
            .and_then(|row| row.satellite_image_url.clone()))
    }

    fn delete_lead(&self, id: &LeadId) -> Result<(), StoreError> {
        if self.fail_connectivity.load(Ordering::Relaxed) {
            return Err(Self::unreachable_error());
        }
        self.lock_rows()?.remove(id.as_str());
        Ok(())
    }
}
