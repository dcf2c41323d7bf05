// SPDX-License-Identifier: Apache-2.0

use crate::{analysis, clock, imagery, Funnel};
use backlot_model::{
    LeadId, LeadSubmission, MirrorSnapshot, NewLead, PropertyAttributes, ValidationError,
};
use backlot_store::{LeadStore as _, StoreError};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmitError {
    /// Pre-flight rejection; nothing reached the network.
    Validation(ValidationError),
    /// The insert failed; no partial row exists.
    Store(StoreError),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<ValidationError> for SubmitError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<StoreError> for SubmitError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// What a successful submission hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub lead_id: LeadId,
    pub address: String,
    pub service_available: bool,
}

pub(crate) fn run(funnel: &Funnel, form: &LeadSubmission) -> Result<SubmissionReceipt, SubmitError> {
    let validated = form.validate()?;

    // Mirror first: the snapshot must exist even if the insert fails, so
    // the analysis page has something to fall back on.
    let snapshot = MirrorSnapshot::from_submission(&validated, clock::unix_millis());
    funnel.mirror().record(&snapshot);

    let service_available = validated.service_available();

    // Reuse the imagery reference of an earlier submission for the same
    // address; a failed lookup is logged and ignored.
    let reused = match funnel.store().find_satellite_image(&validated.address) {
        Ok(url) => url,
        Err(err) => {
            warn!(target: "backlot_funnel", error = %err, "existing-address lookup failed");
            None
        }
    };
    let satellite_image_url = match reused {
        Some(url) => {
            info!(target: "backlot_funnel", "reusing satellite image for repeat address");
            url
        }
        None if service_available => imagery::satellite_image_url(
            &validated.address,
            funnel.config().maps_api_key.as_deref(),
            imagery::DEFAULT_IMAGE_WIDTH,
            imagery::DEFAULT_IMAGE_HEIGHT,
            imagery::DEFAULT_IMAGE_ZOOM,
        ),
        None => imagery::out_of_region_placeholder(),
    };

    let attributes = if service_available {
        analysis::generate_attributes(&validated.address)
    } else {
        PropertyAttributes::default()
    };

    let (street, city, state, zip_code) = match &validated.components {
        Some(addr) => (
            Some(addr.street.clone()),
            Some(addr.city.clone()),
            Some(addr.state.as_str().to_string()),
            Some(addr.zip.as_str().to_string()),
        ),
        None => (
            None,
            None,
            validated.state.as_ref().map(|s| s.as_str().to_string()),
            None,
        ),
    };

    let new_lead = NewLead {
        address: validated.address.clone(),
        street,
        city,
        state,
        zip_code,
        first_name: validated.first_name.clone(),
        last_name: validated.last_name.clone(),
        email: validated.email.as_str().to_string(),
        lot_size: attributes.lot_size,
        zoning: attributes.zoning,
        allows_adu: attributes.allows_adu,
        max_adu_size: attributes.max_adu_size,
        setback_front: attributes.setback_front,
        setback_back: attributes.setback_back,
        setback_sides: attributes.setback_sides,
        additional_notes: attributes.additional_notes,
        satellite_image_url: Some(satellite_image_url),
        service_available,
    };

    let record = funnel.store().insert_lead(&new_lead)?;
    funnel.mirror().remember_lead_id(&record.id);
    info!(
        target: "backlot_funnel",
        id = %record.id,
        service_available,
        "lead stored"
    );

    Ok(SubmissionReceipt {
        lead_id: record.id,
        address: record.address,
        service_available: record.service_available,
    })
}
