use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path};
use tracing::debug;

/// Mapping of logical service name to credential spec, as read from
/// credentials.json. BTreeMap keeps iteration (and therefore status
/// messages) in a stable order.
pub type CredentialsConfig = BTreeMap<String, CredentialSpec>;

/// One entry in credentials.json:
///
/// ```json
/// {
///   "github": {
///     "envVar": "GITHUB_TOKEN",
///     "secretService": "github",
///     "secretAccount": "api-key",
///     "label": "GitHub API Token",
///     "targetServer": "github-mcp"
///   }
/// }
/// ```
///
/// `label` and `targetServer` fall back to the entry's own key. The other
/// three are required, but a missing one only sinks that entry (it surfaces
/// as an "incomplete config" failure), never the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSpec {
    #[serde(default)]
    pub env_var: Option<String>,

    #[serde(default)]
    pub secret_service: Option<String>,

    #[serde(default)]
    pub secret_account: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub target_server: Option<String>,
}

impl CredentialSpec {
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.label
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(key)
    }

    pub fn target_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.target_server
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(key)
    }

    /// The (env_var, service, account) lookup triple, or None when the
    /// entry is incomplete.
    pub fn lookup(&self) -> Option<(&str, &str, &str)> {
        match (
            self.env_var.as_deref(),
            self.secret_service.as_deref(),
            self.secret_account.as_deref(),
        ) {
            (Some(e), Some(s), Some(a)) if !e.is_empty() && !s.is_empty() && !a.is_empty() => {
                Some((e, s, a))
            }
            _ => None,
        }
    }
}

/// Load credentials.json leniently:
/// - missing or blank file -> empty config, no warning
/// - unreadable or malformed file -> empty config plus a warning
/// - entry whose value is not a spec object -> incomplete entry, rest of
///   the file intact
pub fn load_specs(path: &Path) -> (CredentialsConfig, Option<String>) {
    if !path.exists() {
        return (CredentialsConfig::new(), None);
    }

    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            return (
                CredentialsConfig::new(),
                Some(format!("WARNING: failed to read {}: {e}", path.display())),
            );
        }
    };

    // A freshly-touched file counts as missing, not malformed.
    if text.trim().is_empty() {
        return (CredentialsConfig::new(), None);
    }

    let root: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            return (
                CredentialsConfig::new(),
                Some(format!("WARNING: failed to parse {}: {e}", path.display())),
            );
        }
    };

    let Some(map) = root.as_object() else {
        return (
            CredentialsConfig::new(),
            Some(format!(
                "WARNING: {} is not a JSON object",
                path.display()
            )),
        );
    };

    let mut specs = CredentialsConfig::new();
    for (name, value) in map {
        // A malformed entry degrades to an empty spec so it still shows up
        // downstream as a categorized failure under its own key.
        let spec = serde_json::from_value(value.clone()).unwrap_or_default();
        specs.insert(name.clone(), spec);
    }

    debug!(
        "loaded {} credential spec(s) from {}",
        specs.len(),
        path.display()
    );
    (specs, None)
}
