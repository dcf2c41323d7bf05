#![forbid(unsafe_code)]
//! The lead-capture funnel.
//!
//! One [`Funnel`] is built at startup from a [`FunnelConfig`] and a store,
//! then shared by reference with every surface that needs it. It owns the
//! local mirror (durable + session slots), the submission client, and the
//! resolution fallback chain; [`AnalysisView`] drives the presentation
//! states on top.

pub mod analysis;
mod clock;
pub mod config;
pub mod doctor;
pub mod imagery;
mod mirror;
mod resolve;
mod submit;
mod view;

use backlot_model::{LeadId, LeadSubmission};
use backlot_store::LeadStore;
use std::sync::Arc;

pub use config::FunnelConfig;
pub use doctor::{diagnose, CheckStatus, DoctorCheck, DoctorReport};
pub use mirror::{Mirror, DURABLE_SLOT_FILE, SESSION_SLOT_FILE};
pub use resolve::{Resolution, ResolutionSource, ResolveError, NOT_AVAILABLE};
pub use submit::{SubmissionReceipt, SubmitError};
pub use view::{AnalysisView, ViewState};

pub const CRATE_NAME: &str = "backlot-funnel";

/// Process-wide funnel context: config, store handle, mirror.
pub struct Funnel {
    config: FunnelConfig,
    store: Arc<dyn LeadStore>,
    mirror: Mirror,
}

impl Funnel {
    #[must_use]
    pub fn new(config: FunnelConfig, store: Arc<dyn LeadStore>) -> Self {
        let mirror = Mirror::new(&config.state_dir, &config.session_dir);
        Self {
            config,
            store,
            mirror,
        }
    }

    #[must_use]
    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    #[must_use]
    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    #[must_use]
    pub fn store(&self) -> &dyn LeadStore {
        self.store.as_ref()
    }

    /// Validates and submits a lead; see [`submit`] for the full flow.
    pub fn submit(&self, form: &LeadSubmission) -> Result<SubmissionReceipt, SubmitError> {
        submit::run(self, form)
    }

    /// Resolves a lead record through the ordered fallback chain.
    pub fn resolve(&self, id: Option<LeadId>) -> Result<Resolution, ResolveError> {
        resolve::run(self, id)
    }

    /// Mirror-backed preview for the skip-loading path, if a durable
    /// snapshot exists.
    #[must_use]
    pub fn mirror_preview(&self) -> Option<Resolution> {
        resolve::mirror_preview(self)
    }

    /// Server-only resolution used by the background upgrade: no mirror
    /// fallback, `None` on any failure.
    #[must_use]
    pub fn server_resolution(&self, id: Option<LeadId>) -> Option<Resolution> {
        resolve::server_resolution(self, id)
    }
}
