use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Resolved per-invocation environment: where the credential specs live and
/// where the shared target config lives.
///
/// Both paths are explicit state rather than globals so the whole pipeline
/// can run against scratch files in tests.
#[derive(Debug, Clone)]
pub struct ContextEnv {
    home: PathBuf,
    xdg_config_home: PathBuf,
    credentials_path: PathBuf,
    targets_path: PathBuf,
}

impl ContextEnv {
    /// Path precedence, same contract for both files:
    /// 1) CLI flag
    /// 2) env var (PERIGEE_CREDENTIALS / PERIGEE_TARGETS)
    /// 3) per-user default
    ///
    /// Neither file is created here; absence is a normal empty state.
    pub fn new(cli_credentials: Option<&Path>, cli_targets: Option<&Path>) -> Result<Self> {
        let home = dirs::home_dir()
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
            .context("could not determine home directory")?;

        // XDG_CONFIG_HOME: honor if present, else fallback to ~/.config
        let xdg_config_home = match env_path("XDG_CONFIG_HOME") {
            Some(p) => p,
            None => home.join(".config"),
        };

        let credentials_path = cli_credentials
            .map(Path::to_path_buf)
            .or_else(|| env_path("PERIGEE_CREDENTIALS"))
            .unwrap_or_else(|| xdg_config_home.join("perigee").join("credentials.json"));

        let targets_path = cli_targets
            .map(Path::to_path_buf)
            .or_else(|| env_path("PERIGEE_TARGETS"))
            .unwrap_or_else(|| home.join(".perigee.json"));

        Ok(Self {
            home,
            xdg_config_home,
            credentials_path,
            targets_path,
        })
    }

    // ---------- public getters ----------

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    pub fn targets_path(&self) -> &Path {
        &self.targets_path
    }

    pub fn default_credentials_path(&self) -> PathBuf {
        self.xdg_config_home.join("perigee").join("credentials.json")
    }

    pub fn default_targets_path(&self) -> PathBuf {
        self.home.join(".perigee.json")
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
