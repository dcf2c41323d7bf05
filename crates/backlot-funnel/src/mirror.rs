// SPDX-License-Identifier: Apache-2.0

use backlot_model::{LeadId, MirrorSnapshot};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Durable slot file name; outlives the session.
pub const DURABLE_SLOT_FILE: &str = "property_form_data.json";
/// Session slot file name; lives under a tmp-backed dir by default.
pub const SESSION_SLOT_FILE: &str = "last_submission.json";

/// Dual write-through cache shadowing the last submitted form.
///
/// Both slots hold the same JSON snapshot. Writes are best-effort: a slot
/// that cannot be written is logged and skipped, never surfaced. Losing
/// the mirror must not fail a submission.
pub struct Mirror {
    durable_path: PathBuf,
    session_path: PathBuf,
}

impl Mirror {
    #[must_use]
    pub fn new(state_dir: &Path, session_dir: &Path) -> Self {
        Self {
            durable_path: state_dir.join(DURABLE_SLOT_FILE),
            session_path: session_dir.join(SESSION_SLOT_FILE),
        }
    }

    /// Overwrites both slots with a fresh snapshot.
    pub fn record(&self, snapshot: &MirrorSnapshot) {
        write_slot(&self.durable_path, snapshot);
        write_slot(&self.session_path, snapshot);
    }

    /// Stamps the server-issued identifier into both slots.
    pub fn remember_lead_id(&self, id: &LeadId) {
        for path in [&self.durable_path, &self.session_path] {
            if let Some(mut snapshot) = read_slot(path) {
                snapshot.lead_id = Some(id.as_str().to_string());
                write_slot(path, &snapshot);
            }
        }
    }

    #[must_use]
    pub fn durable_snapshot(&self) -> Option<MirrorSnapshot> {
        read_slot(&self.durable_path)
    }

    #[must_use]
    pub fn session_snapshot(&self) -> Option<MirrorSnapshot> {
        read_slot(&self.session_path)
    }

    /// Identifier recovered from the session slot, when one was recorded
    /// and still parses.
    #[must_use]
    pub fn session_lead_id(&self) -> Option<LeadId> {
        self.session_snapshot()
            .and_then(|snapshot| snapshot.lead_id)
            .and_then(|raw| LeadId::parse(&raw).ok())
    }
}

fn write_slot(path: &Path, snapshot: &MirrorSnapshot) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!(target: "backlot_funnel", path = %path.display(), error = %err, "mirror dir create failed");
            return;
        }
    }
    match serde_json::to_vec_pretty(snapshot) {
        Ok(bytes) => {
            if let Err(err) = fs::write(path, bytes) {
                warn!(target: "backlot_funnel", path = %path.display(), error = %err, "mirror slot write failed");
            }
        }
        Err(err) => {
            warn!(target: "backlot_funnel", error = %err, "mirror snapshot serialize failed");
        }
    }
}

fn read_slot(path: &Path) -> Option<MirrorSnapshot> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return None,
    };
    match serde_json::from_slice(&bytes) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(target: "backlot_funnel", path = %path.display(), error = %err, "mirror slot unreadable");
            None
        }
    }
}
