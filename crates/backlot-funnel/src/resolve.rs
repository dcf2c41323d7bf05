// SPDX-License-Identifier: Apache-2.0

use crate::{clock, imagery, Funnel};
use backlot_model::{LeadId, LeadRecord, MirrorSnapshot};
use backlot_store::{LeadStore as _, StoreError};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::{info, warn};

/// Attribute value shown when only mirror data is on hand.
pub const NOT_AVAILABLE: &str = "Not available";

const PROCESSING_NOTE: &str = "Your property details are being processed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ResolutionSource {
    Server,
    Mirror,
}

impl ResolutionSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Mirror => "mirror",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub record: LeadRecord,
    pub source: ResolutionSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveError {
    /// No identifier anywhere and no mirror to fall back on.
    NoIdentifier,
    /// The server attempt failed and no mirror was available either.
    Exhausted { server: StoreError },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoIdentifier => {
                write!(f, "no submission id provided and no saved submission to fall back on")
            }
            Self::Exhausted { server } => {
                write!(f, "unable to load the property analysis: {server}")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// One rung of the fallback ladder.
enum Strategy {
    ServerFetch(LeadId),
    DurableMirror,
}

fn plan(funnel: &Funnel, explicit: Option<LeadId>) -> Vec<Strategy> {
    let mut plan = Vec::with_capacity(2);
    let id = explicit.or_else(|| funnel.mirror().session_lead_id());
    if let Some(id) = id {
        plan.push(Strategy::ServerFetch(id));
    }
    // The mirror is only ever consulted after the server attempt failed
    // or no identifier existed at all.
    plan.push(Strategy::DurableMirror);
    plan
}

pub(crate) fn run(funnel: &Funnel, explicit: Option<LeadId>) -> Result<Resolution, ResolveError> {
    let mut last_server_error: Option<StoreError> = None;

    for strategy in plan(funnel, explicit) {
        match strategy {
            Strategy::ServerFetch(id) => match fetch_from_server(funnel, &id) {
                Ok(record) => {
                    info!(target: "backlot_funnel", id = %id, "resolved from server");
                    return Ok(Resolution {
                        record,
                        source: ResolutionSource::Server,
                    });
                }
                Err(err) => {
                    warn!(target: "backlot_funnel", id = %id, error = %err, "server resolution failed");
                    last_server_error = Some(err);
                }
            },
            Strategy::DurableMirror => {
                if let Some(snapshot) = funnel.mirror().durable_snapshot() {
                    info!(target: "backlot_funnel", "resolved from local mirror");
                    return Ok(Resolution {
                        record: pending_record(&snapshot),
                        source: ResolutionSource::Mirror,
                    });
                }
            }
        }
    }

    match last_server_error {
        Some(server) => Err(ResolveError::Exhausted { server }),
        None => Err(ResolveError::NoIdentifier),
    }
}

pub(crate) fn mirror_preview(funnel: &Funnel) -> Option<Resolution> {
    funnel.mirror().durable_snapshot().map(|snapshot| Resolution {
        record: pending_record(&snapshot),
        source: ResolutionSource::Mirror,
    })
}

pub(crate) fn server_resolution(funnel: &Funnel, explicit: Option<LeadId>) -> Option<Resolution> {
    let id = explicit.or_else(|| funnel.mirror().session_lead_id())?;
    match fetch_from_server(funnel, &id) {
        Ok(record) => Some(Resolution {
            record,
            source: ResolutionSource::Server,
        }),
        Err(err) => {
            warn!(target: "backlot_funnel", id = %id, error = %err, "background resolution failed");
            None
        }
    }
}

fn fetch_from_server(funnel: &Funnel, id: &LeadId) -> Result<LeadRecord, StoreError> {
    funnel.store().check_connectivity()?;
    funnel.store().fetch_lead(id)
}

/// Best-effort stand-in built from the durable snapshot while the server
/// record is unreachable.
fn pending_record(snapshot: &MirrorSnapshot) -> LeadRecord {
    let id = snapshot
        .lead_id
        .as_deref()
        .and_then(|raw| LeadId::parse(raw).ok())
        .unwrap_or_else(|| pending_id());
    let na = || Some(NOT_AVAILABLE.to_string());
    LeadRecord {
        id,
        address: snapshot.address.clone(),
        street: some_if_present(&snapshot.street),
        city: some_if_present(&snapshot.city),
        state: some_if_present(&snapshot.state),
        zip_code: some_if_present(&snapshot.zip_code),
        first_name: snapshot.first_name.clone(),
        last_name: snapshot.last_name.clone(),
        email: snapshot.email.clone(),
        lot_size: na(),
        zoning: na(),
        allows_adu: true,
        max_adu_size: na(),
        setback_front: na(),
        setback_back: na(),
        setback_sides: na(),
        additional_notes: vec![PROCESSING_NOTE.to_string()],
        satellite_image_url: Some(imagery::pending_placeholder()),
        service_available: snapshot.service_available(),
        created_at: if snapshot.saved_at_ms > 0 {
            snapshot.saved_at_ms.to_string()
        } else {
            clock::unix_millis().to_string()
        },
    }
}

fn pending_id() -> LeadId {
    match LeadId::parse("pending") {
        Ok(id) => id,
        Err(_) => unreachable!("static pending id parses"),
    }
}

fn some_if_present(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
