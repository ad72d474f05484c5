pub mod cli;
pub mod config;
pub mod context;
pub mod hook;
pub mod inject;
pub mod remove;
pub mod store;
pub mod targets;

// Convenience re-exports (optional, but nice)
pub use config::{CredentialSpec, CredentialsConfig};
pub use context::ContextEnv;
pub use hook::HookResponse;
pub use store::{SecretStore, SystemKeyring};
pub use targets::TargetDocument;
