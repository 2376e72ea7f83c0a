//! Checks that the main banner drives visitors somewhere useful.

use crate::descriptor_for;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::Fetcher;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Locates the main banner container via the configured selector list and
/// requires at least one link from it to an internal content page —
/// institutional pages (contact, about, ...) don't count as a banner
/// destination.
pub struct BannerLinksCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
    selectors: Vec<String>,
    excluded_paths: Vec<String>,
}

impl BannerLinksCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("banner_link_checker", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
            selectors: cfg.checks.banner_selectors.clone(),
            excluded_paths: cfg.checks.banner_excluded_paths.clone(),
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }

    // Links inside the first matching banner container, resolved against
    // the page URL. `None` when no configured selector matches anything.
    fn banner_links(&self, html: &str, base: &Url) -> Option<Vec<String>> {
        let document = Html::parse_document(html);
        let anchors = Selector::parse("a[href]").expect("static selector parses");

        for selector in &self.selectors {
            let Ok(parsed) = Selector::parse(selector) else {
                debug!(selector, "skipping unparseable banner selector");
                continue;
            };
            let Some(container) = document.select(&parsed).next() else {
                continue;
            };

            let mut links = Vec::new();
            for anchor in container.select(&anchors) {
                let href = anchor.value().attr("href").unwrap_or_default().trim();
                if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
                    continue;
                }
                if let Ok(resolved) = base.join(href) {
                    let resolved = resolved.to_string();
                    if !links.contains(&resolved) {
                        links.push(resolved);
                    }
                }
            }
            return Some(links);
        }
        None
    }

    // A banner destination is an internal page that is neither the
    // homepage nor one of the configured institutional paths.
    fn is_content_destination(&self, link: &str, base: &Url) -> bool {
        let Ok(parsed) = Url::parse(link) else {
            return false;
        };
        if parsed.host_str() != base.host_str() {
            return false;
        }
        let link_path = parsed.path().trim_end_matches('/');
        if link_path.is_empty() {
            return false;
        }
        !self
            .excluded_paths
            .iter()
            .any(|excluded| link_path.starts_with(excluded.trim_end_matches('/')))
    }
}

#[async_trait]
impl Check for BannerLinksCheck {
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

        let fetcher = match Fetcher::new(1, self.timeout) {
            Ok(fetcher) => fetcher,
            Err(e) => return self.outcome(Verdict::Error, format!("http client error: {e}")),
        };

        let body = match fetcher.get_text(url).await {
            Ok(body) => body,
            Err(e) => {
                return self.outcome(Verdict::Error, format!("failed to load page: {e}"));
            }
        };

        let Some(links) = self.banner_links(&body, &base) else {
            return self.outcome(
                Verdict::Attention,
                "no banner container matched the configured selectors",
            );
        };
        // A purely decorative banner is acceptable; only a banner that
        // links somewhere is held to the destination rule.
        if links.is_empty() {
            return self.outcome(Verdict::Approved, "banner carries no links");
        }

        let destinations: Vec<String> = links
            .iter()
            .filter(|link| self.is_content_destination(link, &base))
            .cloned()
            .collect();

        if destinations.is_empty() {
            self.outcome(
                Verdict::Rejected,
                Details::findings(vec![
                    ("banner_links", json!(links)),
                    (
                        "reason",
                        json!("no banner link points at an internal content page"),
                    ),
                ]),
            )
        } else {
            self.outcome(
                Verdict::Approved,
                Details::findings(vec![("destinations", json!(destinations))]),
            )
        }
    }
}
