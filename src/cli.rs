use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "perigee", version, about)]
pub struct Args {
    /// Path to credentials.json (overrides PERIGEE_CREDENTIALS and XDG default)
    #[arg(long, global = true)]
    pub credentials: Option<std::path::PathBuf>,

    /// Path to the target config (overrides PERIGEE_TARGETS and ~/.perigee.json)
    #[arg(long, global = true)]
    pub targets: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Inject keyring secrets into target env maps (session start)
    Inject,
    /// Remove previously injected secrets (session end)
    Remove,
}
