// SPDX-License-Identifier: Apache-2.0

use backlot_store::{RestStore, StoreError, StoreErrorKind};
use std::env;
use std::path::PathBuf;

fn env_str(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(name: &str, default: PathBuf) -> PathBuf {
    env_str(name).map_or(default, PathBuf::from)
}

/// Process-wide configuration, read from the environment exactly once at
/// startup and passed by reference from there on.
#[derive(Debug, Clone)]
pub struct FunnelConfig {
    /// Base URL of the hosted store (`BACKLOT_STORE_URL`).
    pub store_url: Option<String>,
    /// Anonymous API key for the hosted store (`BACKLOT_STORE_ANON_KEY`).
    pub store_anon_key: Option<String>,
    /// Static-map API key (`BACKLOT_MAPS_API_KEY`); absent means
    /// placeholder imagery.
    pub maps_api_key: Option<String>,
    /// Directory holding the durable mirror slot (`BACKLOT_STATE_DIR`).
    pub state_dir: PathBuf,
    /// Directory holding the session mirror slot (`BACKLOT_SESSION_DIR`);
    /// defaults under the OS temp dir so it does not outlive the machine
    /// session.
    pub session_dir: PathBuf,
}

impl FunnelConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            store_url: env_str("BACKLOT_STORE_URL"),
            store_anon_key: env_str("BACKLOT_STORE_ANON_KEY"),
            maps_api_key: env_str("BACKLOT_MAPS_API_KEY"),
            state_dir: env_path("BACKLOT_STATE_DIR", PathBuf::from(".backlot/state")),
            session_dir: env_path(
                "BACKLOT_SESSION_DIR",
                env::temp_dir().join("backlot-session"),
            ),
        }
    }

    /// Builds the REST store client from the configured endpoint.
    pub fn build_store(&self) -> Result<RestStore, StoreError> {
        let url = self.store_url.as_deref().ok_or_else(|| {
            StoreError::new(
                StoreErrorKind::Validation,
                "BACKLOT_STORE_URL is not set; point it at the hosted store",
            )
        })?;
        let key = self.store_anon_key.as_deref().ok_or_else(|| {
            StoreError::new(
                StoreErrorKind::Validation,
                "BACKLOT_STORE_ANON_KEY is not set; use the store's anonymous key",
            )
        })?;
        RestStore::new(url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_store_requires_both_endpoint_values() {
        let config = FunnelConfig {
            store_url: None,
            store_anon_key: Some("anon".to_string()),
            maps_api_key: None,
            state_dir: PathBuf::from("x"),
            session_dir: PathBuf::from("y"),
        };
        let err = config.build_store().expect_err("must fail");
        assert_eq!(err.kind, StoreErrorKind::Validation);
        assert!(err.message.contains("BACKLOT_STORE_URL"));
    }
}
