// SPDX-License-Identifier: Apache-2.0

use crate::{Funnel, Resolution, ResolveError};
use backlot_model::LeadId;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::debug;

/// Presentation states for the analysis page.
///
/// `Loading` transitions to exactly one of the other three; none of them
/// re-enters except through an explicit [`AnalysisView::retry`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ViewState {
    Loading,
    /// Resolved and inside the served region: full property details.
    Available(Resolution),
    /// Resolved but outside the served region: region-limitation notice
    /// instead of property details.
    Unavailable(Resolution),
    Error(String),
}

impl ViewState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Available(_) => "available",
            Self::Unavailable(_) => "unavailable",
            Self::Error(_) => "error",
        }
    }

    #[must_use]
    pub fn from_resolution(resolution: Resolution) -> Self {
        if resolution.record.service_available {
            Self::Available(resolution)
        } else {
            Self::Unavailable(resolution)
        }
    }

    fn from_outcome(outcome: Result<Resolution, ResolveError>) -> Self {
        match outcome {
            Ok(resolution) => Self::from_resolution(resolution),
            Err(err) => Self::Error(err.to_string()),
        }
    }
}

/// Drives the analysis page: load, optional skip-loading preview with a
/// background upgrade, and manual retry.
pub struct AnalysisView {
    funnel: Arc<Funnel>,
    state: Arc<Mutex<ViewState>>,
    upgrade: Mutex<Option<JoinHandle<()>>>,
}

impl AnalysisView {
    #[must_use]
    pub fn new(funnel: Arc<Funnel>) -> Self {
        Self {
            funnel,
            state: Arc::new(Mutex::new(ViewState::Loading)),
            upgrade: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_else(|_| ViewState::Error("view state lock poisoned".to_string()))
    }

    /// Resolves and settles the view.
    ///
    /// With `skip_loading` set and a mirror snapshot on hand, the mirror
    /// render is shown immediately and a background fetch upgrades it if
    /// the server answers later (last-write-wins; a failed upgrade leaves
    /// the mirror render in place).
    pub fn load(&self, id: Option<LeadId>, skip_loading: bool) {
        if skip_loading {
            if let Some(preview) = self.funnel.mirror_preview() {
                debug!(target: "backlot_funnel", "rendering mirror preview before server answer");
                self.set_state(ViewState::from_resolution(preview));
                self.spawn_upgrade(id);
                return;
            }
        }
        self.set_state(ViewState::Loading);
        let outcome = self.funnel.resolve(id);
        self.set_state(ViewState::from_outcome(outcome));
    }

    /// Explicit user action: re-enter the flow from the error state.
    pub fn retry(&self, id: Option<LeadId>) {
        self.load(id, false);
    }

    /// Joins a pending background upgrade; test hook.
    pub fn wait_for_upgrade(&self) {
        let handle = self.upgrade.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn set_state(&self, next: ViewState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    fn spawn_upgrade(&self, id: Option<LeadId>) {
        let funnel = Arc::clone(&self.funnel);
        let state = Arc::clone(&self.state);
        let handle = std::thread::spawn(move || {
            if let Some(resolution) = funnel.server_resolution(id) {
                if let Ok(mut slot) = state.lock() {
                    *slot = ViewState::from_resolution(resolution);
                }
            }
        });
        if let Ok(mut slot) = self.upgrade.lock() {
            *slot = Some(handle);
        }
    }
}
