// SPDX-License-Identifier: Apache-2.0

use crate::error::{StoreError, StoreErrorKind};
use crate::lead_store::LeadStore;
use backlot_model::{LeadId, LeadRecord, NewLead};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// The single externally-defined table this application touches.
pub const LEAD_TABLE: &str = "property_submissions";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error envelope the hosted store's REST layer returns.
#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ImageRow {
    #[serde(default)]
    satellite_image_url: Option<String>,
}

/// Blocking client for the hosted store's REST dialect.
#[derive(Debug)]
pub struct RestStore {
    base_url: String,
    anon_key: String,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                StoreError::new(StoreErrorKind::Unknown, format!("http client init failed: {e}"))
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            client,
        })
    }

    fn table_url(&self, query: &str) -> String {
        format!("{}/rest/v1/{LEAD_TABLE}{query}", self.base_url)
    }

    fn send(&self, req: reqwest::blocking::RequestBuilder) -> Result<Response, StoreError> {
        let resp = req
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .map_err(transport_error)?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(decode_error(resp))
        }
    }

    /// Runs arbitrary SQL through the store's `exec_sql` helper function,
    /// when the instance has one. Provisioning-only; nothing in the
    /// runtime flows calls this.
    pub fn exec_sql(&self, sql: &str) -> Result<(), StoreError> {
        debug!(target: "backlot_store", "exec_sql invocation");
        let url = format!("{}/rest/v1/rpc/exec_sql", self.base_url);
        self.send(
            self.client
                .post(url)
                .json(&serde_json::json!({ "sql": sql })),
        )?;
        Ok(())
    }
}

impl LeadStore for RestStore {
    fn check_connectivity(&self) -> Result<(), StoreError> {
        debug!(target: "backlot_store", "connectivity probe");
        self.send(self.client.get(self.table_url("?select=id&limit=1")))?;
        Ok(())
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<LeadRecord, StoreError> {
        debug!(target: "backlot_store", address = %lead.address, "insert lead");
        let resp = self.send(
            self.client
                .post(self.table_url(""))
                .header("Prefer", "return=representation")
                .json(&[lead]),
        )?;
        let mut rows: Vec<LeadRecord> = decode_rows(resp)?;
        rows.pop().ok_or_else(|| {
            StoreError::new(
                StoreErrorKind::Parse,
                "insert succeeded but the store returned no row",
            )
        })
    }

    fn fetch_lead(&self, id: &LeadId) -> Result<LeadRecord, StoreError> {
        debug!(target: "backlot_store", id = %id, "fetch lead");
        let query = format!("?select=*&id=eq.{}", percent_encode(id.as_str()));
        let resp = self.send(self.client.get(self.table_url(&query)))?;
        let mut rows: Vec<LeadRecord> = decode_rows(resp)?;
        rows.pop().ok_or_else(|| {
            StoreError::new(
                StoreErrorKind::NotFound,
                format!("lead {id} not found; it may have been deleted or the id is incorrect"),
            )
        })
    }

    fn find_satellite_image(&self, address: &str) -> Result<Option<String>, StoreError> {
        debug!(target: "backlot_store", "satellite image lookup");
        let query = format!(
            "?select=satellite_image_url&address=eq.{}&limit=1",
            percent_encode(address)
        );
        let resp = self.send(self.client.get(self.table_url(&query)))?;
        let mut rows: Vec<ImageRow> = decode_rows(resp)?;
        Ok(rows.pop().and_then(|row| row.satellite_image_url))
    }

    fn delete_lead(&self, id: &LeadId) -> Result<(), StoreError> {
        debug!(target: "backlot_store", id = %id, "delete lead");
        let query = format!("?id=eq.{}", percent_encode(id.as_str()));
        self.send(self.client.delete(self.table_url(&query)))?;
        Ok(())
    }
}

fn decode_rows<T: serde::de::DeserializeOwned>(resp: Response) -> Result<Vec<T>, StoreError> {
    resp.json().map_err(|e| {
        StoreError::new(
            StoreErrorKind::Parse,
            format!("malformed response from the store: {e}"),
        )
    })
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_connect() || err.is_timeout() {
        StoreError::new(
            StoreErrorKind::Connectivity,
            format!("cannot reach the store: {err}"),
        )
    } else {
        StoreError::new(StoreErrorKind::Unknown, format!("request failed: {err}"))
    }
}

fn decode_error(resp: Response) -> StoreError {
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if let Ok(wire) = serde_json::from_str::<WireError>(&body) {
        return map_wire_error(&wire);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return StoreError::new(
            StoreErrorKind::Permission,
            format!("store rejected the request with HTTP {status}"),
        );
    }
    StoreError::new(
        StoreErrorKind::Unknown,
        format!("store returned HTTP {status}: {}", truncate(&body, 200)),
    )
}

fn map_wire_error(wire: &WireError) -> StoreError {
    match wire.code.as_str() {
        "42P01" => StoreError::with_wire(
            StoreErrorKind::Permission,
            "the lead table doesn't exist; run `backlot setup` to provision the store",
            "42P01",
        ),
        "42501" => StoreError::with_wire(
            StoreErrorKind::Permission,
            "permission denied; row security policies need to be configured (run `backlot setup`)",
            "42501",
        ),
        "PGRST116" => StoreError::with_wire(
            StoreErrorKind::NotFound,
            "no lead matches the requested id",
            "PGRST116",
        ),
        code if wire.message.contains("exec_sql") && wire.message.contains("does not exist") => {
            StoreError::with_wire(
                StoreErrorKind::Permission,
                "the exec_sql helper function is missing; create it from the provisioning SQL first",
                code,
            )
        }
        "" => StoreError::new(
            StoreErrorKind::Unknown,
            format!("store error: {}", truncate(&wire.message, 200)),
        ),
        code => StoreError::with_wire(
            StoreErrorKind::Unknown,
            format!("store error {code}: {}", truncate(&wire.message, 200)),
            code,
        ),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    let mut end = text.len().min(max);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push(char::from_digit(u32::from(byte >> 4), 16)
                    .map(|c| c.to_ascii_uppercase())
                    .unwrap_or('0'));
                out.push(char::from_digit(u32::from(byte & 0x0f), 16)
                    .map(|c| c.to_ascii_uppercase())
                    .unwrap_or('0'));
            }
        }
    }
    out
}
