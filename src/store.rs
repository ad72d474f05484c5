//! OS secret-store access.
//!
//! Wraps the `keyring` crate, which resolves to the platform store:
//! - macOS: Keychain
//! - Linux: Secret Service (GNOME Keyring / KWallet)
//! - Windows: Credential Manager

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// A secret lookup keyed by (service, account).
///
/// Backend trouble is absence: a credential that cannot be read must never
/// take the rest of the run down with it.
pub trait SecretStore {
    fn get(&self, service: &str, account: &str) -> Option<String>;
}

#[derive(Debug, Error)]
#[error("secret store unavailable: {reason}")]
pub struct StoreUnavailable {
    reason: String,
}

/// The platform keyring.
#[derive(Debug, Clone, Copy)]
pub struct SystemKeyring;

impl SystemKeyring {
    /// Probe the platform store once, before any file is touched.
    ///
    /// The keyring crate only surfaces backend problems at first access, so
    /// a sentinel lookup stands in for a capability check: `NoEntry` means
    /// the backend answered, a platform-level error means it cannot.
    pub fn probe() -> Result<Self, StoreUnavailable> {
        let entry = keyring::Entry::new("perigee", "availability-probe").map_err(|e| {
            StoreUnavailable {
                reason: e.to_string(),
            }
        })?;

        match entry.get_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(Self),
            Err(e @ (keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_))) => {
                Err(StoreUnavailable {
                    reason: e.to_string(),
                })
            }
            // Anything else (bad encoding, ambiguity) still proves the
            // backend is there.
            Err(_) => Ok(Self),
        }
    }
}

impl SecretStore for SystemKeyring {
    fn get(&self, service: &str, account: &str) -> Option<String> {
        let entry = keyring::Entry::new(service, account).ok()?;

        match entry.get_password() {
            // Empty strings count as absent, same as a missing entry.
            Ok(secret) if !secret.is_empty() => Some(secret),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                debug!("keyring lookup failed for ({service}, {account}): {e}");
                None
            }
        }
    }
}

/// Test double: a plain map keyed by (service, account).
impl SecretStore for BTreeMap<(String, String), String> {
    fn get(&self, service: &str, account: &str) -> Option<String> {
        BTreeMap::get(self, &(service.to_string(), account.to_string())).cloned()
    }
}
