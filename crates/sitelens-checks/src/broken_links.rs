//! Probes the anchors on the target page for dead destinations.

use crate::{descriptor_for, page};
use async_trait::async_trait;
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::Fetcher;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Links probed per page, at most. Beyond this the sample already tells
/// the story and the fan-out cost stops paying for itself.
const MAX_PROBED_LINKS: usize = 20;

/// Timeout for loading the page under audit (more generous than the
/// per-link probe timeout; the primary page must get a fair chance).
const PAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Extracts up to [`MAX_PROBED_LINKS`] anchors from the page and probes
/// each for liveness under a bounded fan-out.
pub struct BrokenLinksCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
    concurrency: usize,
    transient_retries: u32,
}

impl BrokenLinksCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("broken_links", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
            concurrency: cfg.fetch.link_concurrency,
            transient_retries: cfg.fetch.transient_retries,
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }
}

#[async_trait]
impl Check for BrokenLinksCheck {
    fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(url) = ctx.url() else {
            return self.outcome(Verdict::Error, "no target URL bound");
        };

        let base = match Url::parse(url) {
            Ok(base) => base,
            Err(e) => return self.outcome(Verdict::Error, format!("invalid URL: {e}")),
        };

        let fetcher = match Fetcher::new(self.concurrency, self.timeout) {
            Ok(fetcher) => fetcher.with_transient_retries(self.transient_retries),
            Err(e) => return self.outcome(Verdict::Error, format!("http client error: {e}")),
        };

        // The page itself failing is an assessment failure, not a broken
        // link: there is nothing to fan out over.
        let body = match fetcher.get_text_with_timeout(url, PAGE_FETCH_TIMEOUT).await {
            Ok(body) => body,
            Err(e) => {
                return self.outcome(Verdict::Error, format!("failed to load page: {e}"));
            }
        };

        let mut links = page::extract_links(&body, &base);
        if links.is_empty() {
            return self.outcome(Verdict::Approved, "no links found on the page");
        }
        if links.len() > MAX_PROBED_LINKS {
            debug!(
                url,
                found = links.len(),
                probed = MAX_PROBED_LINKS,
                "capping link fan-out"
            );
            links.truncate(MAX_PROBED_LINKS);
        }

        let total = links.len();
        let results = fetcher.probe_all(links).await;
        let broken: Vec<String> = results
            .iter()
            .filter(|probe| probe.is_broken())
            .map(|probe| match probe.status {
                Some(status) => format!("[{status}] -> {}", probe.url),
                None => format!("[unreachable] -> {}", probe.url),
            })
            .collect();

        if broken.is_empty() {
            self.outcome(Verdict::Approved, format!("{total} links checked, none broken"))
        } else {
            self.outcome(
                Verdict::Rejected,
                Details::findings(vec![
                    ("total_links", json!(total)),
                    ("broken_count", json!(broken.len())),
                    ("broken", json!(broken)),
                ]),
            )
        }
    }
}
