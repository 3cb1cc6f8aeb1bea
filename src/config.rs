//! Store configuration: Firebase web config file merged with CLI overrides.

use crate::store::FirestoreConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The JSON object Firebase hands out for web apps. Only `apiKey` and
/// `projectId` are needed for REST writes; the rest is accepted and ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseWebConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub auth_domain: Option<String>,
    #[serde(default)]
    pub storage_bucket: Option<String>,
    #[serde(default)]
    pub messaging_sender_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub measurement_id: Option<String>,
    /// Firestore database id; `(default)` when absent.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// Values given on the command line (or via environment), which win over the file.
#[derive(Debug, Clone, Default)]
pub struct StoreOverrides {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub database: Option<String>,
    pub timeout: Option<Duration>,
}

pub fn load_web_config(path: &Path) -> Result<FirebaseWebConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read firebase config {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parse firebase config {}", path.display()))
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Merge file and overrides into a complete Firestore configuration.
pub fn resolve(
    file: FirebaseWebConfig,
    overrides: StoreOverrides,
    base_url: &str,
    user_agent: String,
) -> Result<FirestoreConfig> {
    let Some(project_id) = non_empty(overrides.project_id).or(non_empty(file.project_id)) else {
        bail!("missing Firestore project id (use --project-id or a firebase config with projectId)");
    };
    let Some(api_key) = non_empty(overrides.api_key).or(non_empty(file.api_key)) else {
        bail!("missing Firebase API key (use --api-key or a firebase config with apiKey)");
    };
    let database = non_empty(overrides.database)
        .or(non_empty(file.database))
        .unwrap_or_else(|| "(default)".to_string());
    let timeout = overrides.timeout.or(file.timeout).unwrap_or(DEFAULT_TIMEOUT);

    Ok(FirestoreConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        project_id,
        database,
        api_key,
        timeout,
        user_agent,
    })
}
