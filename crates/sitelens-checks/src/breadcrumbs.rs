//! Checks that internal pages carry working breadcrumb navigation.

use crate::{descriptor_for, page};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use scraper::{Html, Selector};
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam, SubProbe, ToleranceTally};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::{Fetcher, RetrySchedule};
use std::time::Duration;
use url::Url;

/// Discovers the site's top-menu pages from the homepage, requires
/// breadcrumb markup on each of them, and probes the breadcrumb trail's
/// own links. A missing or broken trail is a structural defect;
/// unreachable pages count against the availability tolerance instead.
pub struct BreadcrumbsCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
    concurrency: usize,
    schedule: RetrySchedule,
    tolerance_percent: u8,
}

impl BreadcrumbsCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("breadcrumbs", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
            concurrency: cfg.fetch.page_concurrency,
            schedule: RetrySchedule::from_secs(&cfg.fetch.retry_schedule_secs),
            tolerance_percent: cfg.fetch.tolerance_percent,
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }
}

// The breadcrumb trail's link targets, or `None` when the page has no
// breadcrumb markup at all. JSON-LD structured data wins over markup
// heuristics; links back to the page itself are not part of the trail.
fn extract_breadcrumb_links(html: &str, page_url: &Url, base: &Url) -> Option<Vec<String>> {
    let document = Html::parse_document(html);

    if let Some(links) = json_ld_trail(&document, page_url, base) {
        return Some(links);
    }

    let containers = Selector::parse(
        r#"[class*="breadcrumb"], [id*="breadcrumb"], [class*="migalha"], [aria-label*="readcrumb"]"#,
    )
    .expect("static selector parses");
    let anchors = Selector::parse("a[href]").expect("static selector parses");

    let container = document.select(&containers).next()?;
    let mut links = Vec::new();
    for anchor in container.select(&anchors) {
        let href = anchor.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if resolved.host_str() != base.host_str() || page::same_page(&resolved, page_url) {
            continue;
        }
        let resolved = resolved.to_string();
        if !links.contains(&resolved) {
            links.push(resolved);
        }
    }
    Some(links)
}

fn json_ld_trail(document: &Html, page_url: &Url, base: &Url) -> Option<Vec<String>> {
    let scripts =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector parses");

    for script in document.select(&scripts) {
        let text: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            continue;
        };
        if let Some(items) = find_breadcrumb_list(&value) {
            let mut links = Vec::new();
            for item in items {
                let target = item["item"]
                    .as_str()
                    .or_else(|| item["item"]["@id"].as_str())
                    .or_else(|| item["item"]["url"].as_str());
                let Some(target) = target else { continue };
                let Ok(resolved) = base.join(target) else {
                    continue;
                };
                if resolved.host_str() != base.host_str() || page::same_page(&resolved, page_url)
                {
                    continue;
                }
                let resolved = resolved.to_string();
                if !links.contains(&resolved) {
                    links.push(resolved);
                }
            }
            return Some(links);
        }
    }
    None
}

fn find_breadcrumb_list(value: &serde_json::Value) -> Option<&Vec<serde_json::Value>> {
    match value {
        serde_json::Value::Array(items) => items.iter().find_map(find_breadcrumb_list),
        serde_json::Value::Object(map) => {
            let declared = map
                .get("@type")
                .and_then(serde_json::Value::as_str)
                .is_some_and(|t| t == "BreadcrumbList");
            if declared {
                map.get("itemListElement").and_then(serde_json::Value::as_array)
            } else {
                map.values().find_map(find_breadcrumb_list)
            }
        }
        _ => None,
    }
}

#[async_trait]
impl Check for BreadcrumbsCheck {
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
            Ok(fetcher) => fetcher,
            Err(e) => return self.outcome(Verdict::Error, format!("http client error: {e}")),
        };

        let home = match fetcher.get_text_with_schedule(url, &self.schedule).await {
            Ok(body) => body,
            Err(e) => {
                return self.outcome(Verdict::Error, format!("failed to load page: {e}"));
            }
        };

        // Breadcrumbs are expected on inner pages, never on the homepage.
        let pages: Vec<String> = page::find_top_menu_links(&home, &base)
            .into_iter()
            .filter(|link| {
                Url::parse(link).is_ok_and(|parsed| !page::same_page(&parsed, &base))
            })
            .collect();

        if pages.is_empty() {
            return self.outcome(
                Verdict::Attention,
                "could not locate a navigation menu with internal pages",
            );
        }

        let mut futures = FuturesUnordered::new();
        for page_url in pages {
            let fetcher = &fetcher;
            let schedule = &self.schedule;
            let base = &base;
            futures.push(async move {
                let body = match fetcher.get_text_with_schedule(&page_url, schedule).await {
                    Ok(body) => body,
                    Err(e) => return SubProbe::unreachable(page_url, e.to_string()),
                };

                let Ok(parsed) = Url::parse(&page_url) else {
                    return SubProbe::structural(page_url, "unparseable page URL");
                };
                let Some(crumbs) = extract_breadcrumb_links(&body, &parsed, base) else {
                    return SubProbe::structural(page_url, "no breadcrumb markup");
                };
                if crumbs.is_empty() {
                    // Markup present, nothing to probe (text-only trail).
                    return SubProbe::pass(page_url);
                }

                let results = fetcher.probe_all(crumbs).await;
                match results.iter().find(|probe| probe.is_broken()) {
                    Some(broken) => {
                        let label = broken
                            .status
                            .map_or_else(|| "unreachable".to_string(), |s| s.to_string());
                        SubProbe::structural(
                            page_url,
                            format!("breadcrumb link broken: [{label}] {}", broken.url),
                        )
                    }
                    None => SubProbe::pass(page_url),
                }
            });
        }

        let mut probes = Vec::new();
        while let Some(probe) = futures.next().await {
            probes.push(probe);
        }

        let tally = ToleranceTally::from_probes(&probes);
        match tally.verdict(self.tolerance_percent) {
            Verdict::Rejected => {
                let defects: Vec<String> = probes
                    .iter()
                    .filter_map(|probe| match &probe.failure {
                        Some(sitelens_check::SubProbeFailure::Structural(reason)) => {
                            Some(format!("{}: {reason}", probe.target))
                        }
                        _ => None,
                    })
                    .collect();
                self.outcome(
                    Verdict::Rejected,
                    Details::findings(vec![
                        ("pages_checked", json!(tally.total())),
                        ("defects", json!(defects)),
                    ]),
                )
            }
            Verdict::Error => self.outcome(
                Verdict::Error,
                format!(
                    "too many pages unreachable: {:.0}% (tolerance {}%)",
                    tally.unreachable_percent(),
                    self.tolerance_percent
                ),
            ),
            _ => self.outcome(
                Verdict::Approved,
                format!("breadcrumbs present and working on {} pages", tally.total()),
            ),
        }
    }
}
