use std::fmt;
use tracing::debug;

use crate::{
    config::{self, CredentialsConfig},
    context::ContextEnv,
    hook::HookResponse,
    store::SecretStore,
    targets::TargetDocument,
};

/// Why one credential spec did not make it into the target config.
/// Failures are per-entry; one bad spec never blocks the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    IncompleteConfig,
    TargetNotFound(String),
    NotInStore,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::IncompleteConfig => write!(f, "incomplete config"),
            SkipReason::TargetNotFound(target) => write!(f, "target '{target}' not found"),
            SkipReason::NotInStore => write!(f, "not in keyring"),
        }
    }
}

#[derive(Debug, Default)]
pub struct InjectReport {
    pub injected: Vec<String>,
    pub failed: Vec<(String, SkipReason)>,
    pub modified: bool,
}

/// Resolve every spec against the store and patch the document in place.
pub fn inject_into(
    doc: &mut TargetDocument,
    specs: &CredentialsConfig,
    store: &dyn SecretStore,
) -> InjectReport {
    let mut report = InjectReport::default();

    for (name, spec) in specs {
        let label = spec.label_for(name);

        let Some((env_var, service, account)) = spec.lookup() else {
            report
                .failed
                .push((label.to_string(), SkipReason::IncompleteConfig));
            continue;
        };

        let target = spec.target_for(name);
        if !doc.contains_target(target) {
            report
                .failed
                .push((label.to_string(), SkipReason::TargetNotFound(target.to_string())));
            continue;
        }

        let Some(secret) = store.get(service, account) else {
            report
                .failed
                .push((label.to_string(), SkipReason::NotInStore));
            continue;
        };

        if doc.set_env_var(target, env_var, &secret) {
            debug!("injected {env_var} into target '{target}'");
            report.injected.push(label.to_string());
            report.modified = true;
        } else {
            // Target key exists but is not a record; same outcome for the
            // caller as a missing target.
            report
                .failed
                .push((label.to_string(), SkipReason::TargetNotFound(target.to_string())));
        }
    }

    report
}

/// Full injector pipeline: load both files, patch, persist if anything
/// landed, and describe the outcome.
///
/// `None` means stay quiet: nothing configured, nothing worth a message.
pub fn run(ctx: &ContextEnv, store: &dyn SecretStore) -> Option<HookResponse> {
    let (specs, spec_warning) = config::load_specs(ctx.credentials_path());

    if specs.is_empty() {
        // Nothing configured; surface a load warning if there was one.
        return spec_warning.map(HookResponse::message);
    }

    let (doc, target_warning) = TargetDocument::load(ctx.targets_path());
    let mut notes: Vec<String> = spec_warning.into_iter().chain(target_warning).collect();

    let doc = doc.filter(TargetDocument::has_targets);
    let Some(mut doc) = doc else {
        notes.push(format!(
            "WARNING: no targets configured in {}",
            ctx.targets_path().display()
        ));
        return Some(HookResponse::message(notes.join("\n")));
    };

    let report = inject_into(&mut doc, &specs, store);

    if report.modified {
        if let Err(e) = doc.save(ctx.targets_path()) {
            notes.push(format!(
                "ERROR: failed to save credentials to {}: {e:#}",
                ctx.targets_path().display()
            ));
            return Some(HookResponse::message(notes.join("\n")));
        }
    }

    let mut parts = Vec::new();
    if !report.injected.is_empty() {
        parts.push(format!("Injected: {}", report.injected.join(", ")));
    }
    if !report.failed.is_empty() {
        let failed: Vec<String> = report
            .failed
            .iter()
            .map(|(label, why)| format!("{label} ({why})"))
            .collect();
        parts.push(format!("Failed: {}", failed.join(", ")));
    }

    if !parts.is_empty() {
        notes.push(format!("Credentials - {}", parts.join(" | ")));
    }

    if notes.is_empty() {
        None
    } else {
        Some(HookResponse::message(notes.join("\n")))
    }
}
