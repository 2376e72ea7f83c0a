//! Concurrent audit orchestration.
//!
//! The orchestrator dispatches every registered check as its own task,
//! binds each check only the parameters its descriptor declared, and
//! assembles one outcome per dispatched check into an [`AuditReport`].
//! A panicking check degrades into a `Verdict::Error` outcome attributed
//! to that check; it never takes the audit down.

use futures::stream::{FuturesUnordered, StreamExt};
use sitelens_check::{CheckContext, CheckParam, CheckRegistry};
use sitelens_core::{AuditReport, AuditStatus, CheckOutcome, Verdict};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Extra named arguments a caller can supply alongside the target URL.
pub type ExtraArgs = HashMap<String, String>;

/// Dispatches registered checks concurrently and assembles the report.
pub struct AuditOrchestrator {
    registry: CheckRegistry,
}

impl AuditOrchestrator {
    /// Create an orchestrator over the given registry.
    #[must_use]
    pub fn new(registry: CheckRegistry) -> Self {
        Self { registry }
    }

    /// Run one audit against the given target.
    ///
    /// Checks whose hard requirements the inputs cannot satisfy are
    /// skipped, not failed. The returned report carries outcomes in
    /// completion order; consumers key by the `module` field.
    pub async fn run(&self, url: Option<&str>, extra: &ExtraArgs) -> AuditReport {
        let checks = self.registry.get_all();
        if checks.is_empty() {
            warn!("no checks registered, nothing to audit");
            return AuditReport {
                url: url.map(str::to_string),
                validations: Vec::new(),
                status: AuditStatus::NoChecksLoaded,
            };
        }

        let mut tasks = FuturesUnordered::new();
        let mut dispatched = 0usize;
        for check in checks {
            let descriptor = check.descriptor();
            let probe_ctx = CheckContext::new(url.map(str::to_string));
            if !descriptor.runnable_with(&probe_ctx) {
                debug!(check = %descriptor.id(), "skipping: required URL not supplied");
                continue;
            }

            let id = descriptor.id().clone();
            let ctx = bind_context(descriptor.params(), url, extra);
            dispatched += 1;

            // Tag the join handle with the check's identity so even a
            // panicked task stays attributable in the report.
            let handle = tokio::spawn(async move { check.run(&ctx).await });
            tasks.push(async move { (id, handle.await) });
        }

        info!(dispatched, url = url.unwrap_or("-"), "audit started");

        let mut validations = Vec::with_capacity(dispatched);
        while let Some((id, joined)) = tasks.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(check = %id, error = %e, "check task failed");
                    CheckOutcome::new(id, Verdict::Error, format!("check task failed: {e}"))
                }
            };
            debug!(check = %outcome.module, result = %outcome.result, "check finished");
            validations.push(outcome);
        }

        AuditReport {
            url: url.map(str::to_string),
            validations,
            status: AuditStatus::Completed,
        }
    }
}

// Bind only the parameters the check declared; everything else stays
// invisible to it.
fn bind_context(params: &[CheckParam], url: Option<&str>, extra: &ExtraArgs) -> CheckContext {
    let bound_url = params
        .contains(&CheckParam::Url)
        .then(|| url.map(str::to_string))
        .flatten();

    let mut ctx = CheckContext::new(bound_url);
    for param in params {
        if *param == CheckParam::Url {
            continue;
        }
        if let Some(value) = extra.get(param.key()) {
            ctx = ctx.with_extra(param.key(), value.clone());
        }
    }
    ctx
}
