// SPDX-License-Identifier: Apache-2.0

//! One-off provisioning of the hosted store.
//!
//! The schema and access policies live out-of-band; this module ships the
//! SQL text and a stepwise setup routine that applies it through the
//! store's SQL-RPC helper when the instance has one, and otherwise tells
//! the operator exactly what to paste into the hosted SQL console.

use crate::error::StoreErrorKind;
use crate::lead_store::LeadStore;
use crate::rest::RestStore;
use backlot_model::NewLead;
use std::fmt::{Display, Formatter};
use tracing::{info, warn};

pub const CREATE_TABLE_SQL: &str = r#"CREATE TABLE property_submissions (
  id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
  address TEXT NOT NULL,
  street TEXT,
  city TEXT,
  state TEXT,
  zip_code TEXT,
  first_name TEXT NOT NULL,
  last_name TEXT NOT NULL,
  email TEXT NOT NULL,
  lot_size TEXT,
  zoning TEXT,
  allows_adu BOOLEAN DEFAULT true,
  max_adu_size TEXT,
  setback_front TEXT,
  setback_back TEXT,
  setback_sides TEXT,
  additional_notes TEXT[],
  satellite_image_url TEXT,
  service_available BOOLEAN DEFAULT false,
  created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
  updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
);

CREATE OR REPLACE FUNCTION update_modified_column()
RETURNS TRIGGER AS $$
BEGIN
  NEW.updated_at = NOW();
  RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER property_submissions_updated_at
BEFORE UPDATE ON property_submissions
FOR EACH ROW
EXECUTE FUNCTION update_modified_column();
"#;

pub const ROW_SECURITY_SQL: &str = r#"ALTER TABLE property_submissions ENABLE ROW LEVEL SECURITY;

CREATE POLICY "Anyone can insert property submissions"
ON property_submissions
FOR INSERT TO anon
WITH CHECK (true);

CREATE POLICY "Anyone can view property submissions by ID"
ON property_submissions
FOR SELECT TO anon
USING (true);
"#;

pub const EXEC_SQL_FUNCTION_SQL: &str = r#"CREATE OR REPLACE FUNCTION exec_sql(sql text)
RETURNS VOID
LANGUAGE plpgsql
SECURITY DEFINER
AS $$
BEGIN
  EXECUTE sql;
END;
$$;
"#;

/// Everything an operator needs to paste into the hosted SQL console when
/// the SQL-RPC path is unavailable.
#[must_use]
pub fn full_provisioning_sql() -> String {
    format!("{EXEC_SQL_FUNCTION_SQL}\n{CREATE_TABLE_SQL}\n{ROW_SECURITY_SQL}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
    /// The step could not be applied automatically; `detail` carries the
    /// SQL to run by hand.
    Manual,
}

impl StepStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub name: &'static str,
    pub status: StepStatus,
    pub detail: String,
}

impl Display for StepOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.status.as_str(), self.detail)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    pub steps: Vec<StepOutcome>,
}

impl ProvisionReport {
    fn push(&mut self, name: &'static str, status: StepStatus, detail: impl Into<String>) {
        self.steps.push(StepOutcome {
            name,
            status,
            detail: detail.into(),
        });
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|step| matches!(step.status, StepStatus::Passed | StepStatus::Skipped))
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

/// Walks the setup steps in order: connectivity, table, row security,
/// probe row. Later steps are skipped once an earlier one makes them
/// meaningless.
pub fn provision(store: &RestStore) -> ProvisionReport {
    let mut report = ProvisionReport::default();

    let probe = store.check_connectivity();
    match &probe {
        Err(err) if err.kind == StoreErrorKind::Connectivity => {
            report.push("connectivity", StepStatus::Failed, err.to_string());
            report.push("lead table", StepStatus::Skipped, "store unreachable");
            report.push("row security", StepStatus::Skipped, "store unreachable");
            report.push("probe row", StepStatus::Skipped, "store unreachable");
            return report;
        }
        _ => report.push("connectivity", StepStatus::Passed, "store reachable"),
    }

    match probe {
        Ok(()) => {
            report.push("lead table", StepStatus::Passed, "table already exists");
        }
        Err(err) if err.is_missing_table() => {
            info!(target: "backlot_store", "lead table missing; creating it");
            match store.exec_sql(CREATE_TABLE_SQL) {
                Ok(()) => report.push("lead table", StepStatus::Passed, "table created"),
                Err(rpc_err) => {
                    warn!(target: "backlot_store", error = %rpc_err, "automatic table creation failed");
                    report.push(
                        "lead table",
                        StepStatus::Manual,
                        format!(
                            "{rpc_err}; run this SQL in the hosted console:\n{}",
                            full_provisioning_sql()
                        ),
                    );
                    report.push("row security", StepStatus::Skipped, "table creation pending");
                    report.push("probe row", StepStatus::Skipped, "table creation pending");
                    return report;
                }
            }
        }
        Err(err) => {
            report.push("lead table", StepStatus::Failed, err.to_string());
            report.push("row security", StepStatus::Skipped, "table check failed");
            report.push("probe row", StepStatus::Skipped, "table check failed");
            return report;
        }
    }

    match store.exec_sql(ROW_SECURITY_SQL) {
        Ok(()) => report.push("row security", StepStatus::Passed, "policies applied"),
        Err(err) => report.push(
            "row security",
            StepStatus::Manual,
            format!("{err}; run this SQL in the hosted console:\n{ROW_SECURITY_SQL}"),
        ),
    }

    match store.insert_lead(&probe_lead()) {
        Ok(record) => {
            let cleanup = store.delete_lead(&record.id);
            match cleanup {
                Ok(()) => report.push("probe row", StepStatus::Passed, "insert and cleanup succeeded"),
                Err(err) => {
                    warn!(target: "backlot_store", error = %err, "probe row cleanup failed");
                    report.push(
                        "probe row",
                        StepStatus::Passed,
                        format!("insert succeeded; cleanup failed: {err}"),
                    );
                }
            }
        }
        Err(err) => report.push("probe row", StepStatus::Failed, err.to_string()),
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_ddl_covers_every_client_written_column() {
        for column in [
            "address",
            "street",
            "city",
            "state",
            "zip_code",
            "first_name",
            "last_name",
            "email",
            "satellite_image_url",
            "service_available",
            "additional_notes",
        ] {
            assert!(
                CREATE_TABLE_SQL.contains(column),
                "DDL missing column {column}"
            );
        }
    }

    #[test]
    fn manual_bundle_contains_all_three_scripts() {
        let bundle = full_provisioning_sql();
        assert!(bundle.contains("CREATE OR REPLACE FUNCTION exec_sql"));
        assert!(bundle.contains("CREATE TABLE property_submissions"));
        assert!(bundle.contains("ENABLE ROW LEVEL SECURITY"));
    }
}
