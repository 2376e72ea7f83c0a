//! Verifies the site ships a decodable favicon of usable size.

use crate::descriptor_for;
use async_trait::async_trait;
use image::GenericImageView;
use scraper::{Html, Selector};
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::Fetcher;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Minimum acceptable favicon edge, in pixels.
const MIN_FAVICON_EDGE: u32 = 32;

/// Locates the site favicon (declared `link rel=icon`, then the
/// conventional fallback paths), decodes it, and checks its dimensions.
pub struct FaviconCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
}

impl FaviconCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("favicon_check", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }
}

// The favicon URL declared in the page head, if any.
fn declared_favicon(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let links = Selector::parse("link[rel][href]").expect("static selector parses");

    for element in document.select(&links) {
        let rel = element.value().attr("rel").unwrap_or_default();
        if !rel.to_ascii_lowercase().contains("icon") {
            continue;
        }
        let href = element.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() {
            continue;
        }
        if let Ok(resolved) = base.join(href) {
            return Some(resolved.to_string());
        }
    }
    None
}

fn candidate_urls(html: &str, base: &Url) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(declared) = declared_favicon(html, base) {
        candidates.push(declared);
    }
    for fallback in ["/favicon.ico", "/apple-touch-icon.png"] {
        if let Ok(resolved) = base.join(fallback) {
            let resolved = resolved.to_string();
            if !candidates.contains(&resolved) {
                candidates.push(resolved);
            }
        }
    }
    candidates
}

#[async_trait]
impl Check for FaviconCheck {
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

        for candidate in candidate_urls(&body, &base) {
            let bytes = match fetcher.get_bytes(&candidate).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(candidate, error = %e, "favicon candidate not served");
                    continue;
                }
            };

            return match image::load_from_memory(&bytes) {
                Ok(icon) => {
                    let (width, height) = icon.dimensions();
                    if width >= MIN_FAVICON_EDGE && height >= MIN_FAVICON_EDGE {
                        self.outcome(
                            Verdict::Approved,
                            Details::findings(vec![
                                ("favicon", json!(candidate)),
                                ("width", json!(width)),
                                ("height", json!(height)),
                            ]),
                        )
                    } else {
                        self.outcome(
                            Verdict::Rejected,
                            format!("favicon too small: {width}x{height} (minimum {MIN_FAVICON_EDGE}x{MIN_FAVICON_EDGE})"),
                        )
                    }
                }
                Err(e) => self.outcome(
                    Verdict::Rejected,
                    format!("favicon at {candidate} could not be decoded: {e}"),
                ),
            };
        }

        self.outcome(Verdict::Rejected, "no favicon found")
    }
}
