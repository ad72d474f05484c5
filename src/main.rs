use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use perigee::{cli, hook, inject, remove, ContextEnv, HookResponse, SystemKeyring};

fn main() -> ExitCode {
    let args = cli::Args::parse();

    // stderr only; stdout belongs to the hook protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PERIGEE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // Drain stdin before anything else; the runner expects its payload
    // consumed even when nothing here needs it.
    let _payload = hook::read_payload(io::stdin().lock());

    let ctx = match ContextEnv::new(args.credentials.as_deref(), args.targets.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            hook::emit(&HookResponse::message(format!("ERROR: {e:#}")));
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        cli::Command::Inject => {
            // Capability check comes first, before any file is touched.
            let store = match SystemKeyring::probe() {
                Ok(store) => store,
                Err(e) => {
                    hook::emit(&HookResponse::message(format!("ERROR: {e}")));
                    return ExitCode::FAILURE;
                }
            };

            if let Some(response) = inject::run(&ctx, &store) {
                hook::emit(&response);
            }
        }
        cli::Command::Remove => {
            hook::emit(&remove::run(&ctx));
        }
    }

    ExitCode::SUCCESS
}
