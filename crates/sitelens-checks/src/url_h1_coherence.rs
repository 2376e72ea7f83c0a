//! Checks that each page's H1 agrees with its URL slug.

use crate::{descriptor_for, page};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use scraper::{Html, Selector};
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam, SubProbe, ToleranceTally};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::{Fetcher, RetrySchedule};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Portuguese/English connective words ignored when comparing slug
/// tokens against heading tokens.
const STOPWORDS: &[&str] = &[
    "de", "da", "do", "das", "dos", "e", "a", "o", "as", "os", "em", "para", "com", "the",
    "of", "and", "for",
];

/// Discovers the site's top-menu pages and verifies that each page's
/// main heading shares vocabulary with its URL slug. A slug that says
/// one thing while the H1 says another confuses both visitors and
/// search engines.
pub struct UrlH1CoherenceCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
    concurrency: usize,
    schedule: RetrySchedule,
    tolerance_percent: u8,
}

impl UrlH1CoherenceCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("url_h1_coherence", &[CheckParam::Url]),
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

// Fold the accented characters common in Portuguese content so slug and
// heading compare on the same alphabet.
fn fold_accents(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .chars()
        .map(fold_accents)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|word| word.len() >= 3 && !STOPWORDS.contains(word))
        .map(str::to_string)
        .collect()
}

fn first_h1(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let h1 = Selector::parse("h1").expect("static selector parses");
    document.select(&h1).next().map(|element| {
        element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn slug_of(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}

// Coherent when at least half of the slug's meaningful tokens appear in
// the heading. Slugs with no meaningful tokens can't contradict anything.
fn is_coherent(slug: &str, heading: &str) -> bool {
    let slug_tokens = tokens(&slug.replace(['-', '_'], " "));
    if slug_tokens.is_empty() {
        return true;
    }
    let heading_tokens = tokens(heading);
    let shared = slug_tokens.intersection(&heading_tokens).count();
    shared * 2 >= slug_tokens.len()
}

fn assess_page(page_url: &str, html: &str) -> SubProbe {
    let Ok(parsed) = Url::parse(page_url) else {
        return SubProbe::structural(page_url, "unparseable page URL");
    };
    let Some(slug) = slug_of(&parsed) else {
        // Pages without a slug (the root) have nothing to compare.
        return SubProbe::pass(page_url);
    };
    match first_h1(html) {
        None => SubProbe::structural(page_url, "page has no h1"),
        Some(heading) if is_coherent(&slug, &heading) => SubProbe::pass(page_url),
        Some(heading) => SubProbe::structural(
            page_url,
            format!("h1 '{heading}' does not match slug '{slug}'"),
        ),
    }
}

#[async_trait]
impl Check for UrlH1CoherenceCheck {
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
            futures.push(async move {
                match fetcher.get_text_with_schedule(&page_url, schedule).await {
                    Ok(body) => assess_page(&page_url, &body),
                    Err(e) => SubProbe::unreachable(page_url, e.to_string()),
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
                let mismatches: Vec<String> = probes
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
                        ("mismatches", json!(mismatches)),
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
                format!("h1 matches the URL slug on {} pages", tally.total()),
            ),
        }
    }
}
