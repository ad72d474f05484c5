use anyhow::Result;
use std::path::Path;
use tracing::{debug, warn};

use crate::{
    config::{self, CredentialsConfig},
    context::ContextEnv,
    hook::HookResponse,
    targets::TargetDocument,
};

#[derive(Debug, Default)]
pub struct RemoveReport {
    pub removed: Vec<String>,
    pub modified: bool,
}

/// Delete every configured env var that is actually present in the
/// document. Only `envVar` and the target matter here; a spec that cannot
/// inject (incomplete, unknown service) can still clean up after an older
/// run.
pub fn remove_from(doc: &mut TargetDocument, specs: &CredentialsConfig) -> RemoveReport {
    let mut report = RemoveReport::default();

    for (name, spec) in specs {
        let Some(env_var) = spec.env_var.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };

        let target = spec.target_for(name);
        if doc.remove_env_var(target, env_var) {
            debug!("removed {env_var} from target '{target}'");
            report.removed.push(spec.label_for(name).to_string());
            report.modified = true;
        }
    }

    report
}

/// Full remover pipeline. Always resolves to an approve decision; the hook
/// point is non-blocking, so the only question is which status message
/// rides along.
pub fn run(ctx: &ContextEnv) -> HookResponse {
    let (specs, spec_warning) = config::load_specs(ctx.credentials_path());
    if let Some(w) = spec_warning {
        warn!("{w}");
    }

    let (doc, target_warning) = TargetDocument::load(ctx.targets_path());
    if let Some(w) = target_warning {
        warn!("{w}");
    }

    let Some(mut doc) = doc else {
        return HookResponse::approve();
    };
    if specs.is_empty() || !doc.has_targets() {
        return HookResponse::approve();
    }

    let report = remove_from(&mut doc, &specs);

    if !report.modified {
        return HookResponse::approve_with("INFO: credentials already clean (nothing to remove)");
    }

    save_outcome(&report, doc.save(ctx.targets_path()), ctx.targets_path())
}

/// A removal only counts once it is on disk. On a failed save the file
/// still holds every credential, so the warning reports an attempt count
/// and no label is listed as removed.
fn save_outcome(report: &RemoveReport, saved: Result<()>, path: &Path) -> HookResponse {
    match saved {
        Ok(()) => HookResponse::approve_with(format!(
            "Cleaned up {} credential(s): {}",
            report.removed.len(),
            report.removed.join(", ")
        )),
        Err(e) => {
            warn!("failed to save {}: {e:#}", path.display());
            HookResponse::approve_with(format!(
                "WARNING: removed {} credential(s) but failed to save {}\n  \
                 Credentials are still present in the config file\n  \
                 Manual cleanup may be required",
                report.removed.len(),
                path.display()
            ))
        }
    }
}
