// SPDX-License-Identifier: Apache-2.0

//! Diagnostic checks for a configured deployment: is the store reachable,
//! is the table provisioned, do the access policies hold, is imagery set
//! up. Read-only apart from one self-cleaning probe row.

use crate::config::FunnelConfig;
use backlot_model::NewLead;
use backlot_store::{LeadStore, StoreErrorKind};
use std::fmt::{Display, Formatter};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CheckStatus {
    Passed,
    /// Degraded but workable; the funnel falls back to placeholders.
    Warned,
    Failed,
}

impl CheckStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Warned => "warned",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl Display for DoctorCheck {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.status.as_str(), self.detail)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn push(&mut self, name: &'static str, status: CheckStatus, detail: impl Into<String>) {
        self.checks.push(DoctorCheck {
            name,
            status,
            detail: detail.into(),
        });
    }

    /// No check failed outright; warnings don't count against health.
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.checks
            .iter()
            .all(|check| check.status != CheckStatus::Failed)
    }
}

fn probe_lead() -> NewLead {
    NewLead {
        address: "Test Address (will be deleted)".to_string(),
        street: None,
        city: None,
        state: None,
        zip_code: None,
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: "test@example.com".to_string(),
        lot_size: None,
        zoning: None,
        allows_adu: true,
        max_adu_size: None,
        setback_front: None,
        setback_back: None,
        setback_sides: None,
        additional_notes: vec![],
        satellite_image_url: None,
        service_available: false,
    }
}

pub fn diagnose(store: &dyn LeadStore, config: &FunnelConfig) -> DoctorReport {
    let mut report = DoctorReport::default();

    let probe = store.check_connectivity();
    match &probe {
        Ok(()) => report.push("connectivity", CheckStatus::Passed, "store reachable"),
        Err(err) if err.kind == StoreErrorKind::Connectivity => {
            report.push("connectivity", CheckStatus::Failed, err.to_string());
            report.push("lead table", CheckStatus::Failed, "store unreachable");
            report.push("row policies", CheckStatus::Failed, "store unreachable");
            imagery_check(&mut report, config);
            return report;
        }
        Err(_) => report.push(
            "connectivity",
            CheckStatus::Passed,
            "store reachable (table probe failed, see below)",
        ),
    }

    match probe {
        Ok(()) => report.push("lead table", CheckStatus::Passed, "table exists"),
        Err(err) if err.is_missing_table() => {
            report.push(
                "lead table",
                CheckStatus::Failed,
                format!("{err}"),
            );
            report.push("row policies", CheckStatus::Failed, "no table to probe");
            imagery_check(&mut report, config);
            return report;
        }
        Err(err) => {
            report.push("lead table", CheckStatus::Failed, err.to_string());
            report.push("row policies", CheckStatus::Failed, "table probe failed");
            imagery_check(&mut report, config);
            return report;
        }
    }

    match store.insert_lead(&probe_lead()) {
        Ok(record) => {
            if let Err(err) = store.delete_lead(&record.id) {
                warn!(target: "backlot_funnel", error = %err, "doctor probe cleanup failed");
                report.push(
                    "row policies",
                    CheckStatus::Warned,
                    format!("insert works; probe cleanup failed: {err}"),
                );
            } else {
                report.push(
                    "row policies",
                    CheckStatus::Passed,
                    "insert and delete round-trip succeeded",
                );
            }
        }
        Err(err) => report.push(
            "row policies",
            CheckStatus::Failed,
            format!("insert rejected: {err}"),
        ),
    }

    imagery_check(&mut report, config);
    report
}

fn imagery_check(report: &mut DoctorReport, config: &FunnelConfig) {
    match config.maps_api_key.as_deref() {
        Some(key) if !key.is_empty() && key != "your-google-maps-api-key" => {
            report.push("imagery key", CheckStatus::Passed, "configured");
        }
        _ => report.push(
            "imagery key",
            CheckStatus::Warned,
            "not configured; placeholder images will be used",
        ),
    }
}
