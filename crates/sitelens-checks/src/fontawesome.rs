//! Verifies that Font Awesome assets referenced by the page actually load.

use crate::descriptor_for;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::Fetcher;
use std::time::Duration;
use url::Url;

static FONT_AWESOME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)font-?awesome").expect("valid regex"));

/// Finds Font Awesome stylesheet/script includes and probes each for
/// liveness. A page without any include fails: the icon set is part of
/// the expected site template.
pub struct FontAwesomeCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
}

impl FontAwesomeCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("font_awesome", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }
}

// Font Awesome asset URLs referenced by `link href` or `script src`.
fn font_awesome_includes(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let links = Selector::parse("link[href], script[src]").expect("static selector parses");

    let mut includes = Vec::new();
    for element in document.select(&links) {
        let reference = element
            .value()
            .attr("href")
            .or_else(|| element.value().attr("src"))
            .unwrap_or_default()
            .trim();
        if reference.is_empty() || !FONT_AWESOME_RE.is_match(reference) {
            continue;
        }
        if let Ok(resolved) = base.join(reference) {
            let resolved = resolved.to_string();
            if !includes.contains(&resolved) {
                includes.push(resolved);
            }
        }
    }
    includes
}

#[async_trait]
impl Check for FontAwesomeCheck {
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

        let fetcher = match Fetcher::new(2, self.timeout) {
            Ok(fetcher) => fetcher,
            Err(e) => return self.outcome(Verdict::Error, format!("http client error: {e}")),
        };

        let body = match fetcher.get_text(url).await {
            Ok(body) => body,
            Err(e) => {
                return self.outcome(Verdict::Error, format!("failed to load page: {e}"));
            }
        };

        let includes = font_awesome_includes(&body, &base);
        if includes.is_empty() {
            return self.outcome(Verdict::Rejected, "Font Awesome not found on the page");
        }

        let total = includes.len();
        let results = fetcher.probe_all(includes).await;
        let broken: Vec<String> = results
            .iter()
            .filter(|probe| probe.is_broken())
            .map(|probe| probe.url.clone())
            .collect();

        if broken.is_empty() {
            self.outcome(
                Verdict::Approved,
                format!("{total} Font Awesome assets load correctly"),
            )
        } else {
            self.outcome(
                Verdict::Rejected,
                Details::findings(vec![
                    ("total_assets", json!(total)),
                    ("unavailable", json!(broken)),
                ]),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn check() -> FontAwesomeCheck {
        FontAwesomeCheck::new(&AuditConfig::default())
    }

    #[test]
    fn test_include_detection() {
        let base = Url::parse("https://example.com/").expect("parse base url");
        let html = r#"
            <link rel="stylesheet" href="/css/fontawesome.min.css">
            <script src="https://cdn.test/font-awesome/6.5/all.js"></script>
            <link rel="stylesheet" href="/css/site.css">
        "#;

        let includes = font_awesome_includes(html, &base);
        assert_eq!(
            includes,
            vec![
                "https://example.com/css/fontawesome.min.css".to_string(),
                "https://cdn.test/font-awesome/6.5/all.js".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_include_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<head></head>"))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);
    }

    #[tokio::test]
    async fn test_live_include_approved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<link rel="stylesheet" href="/fontawesome.css">"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/fontawesome.css"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Approved);
    }

    #[tokio::test]
    async fn test_dead_include_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<link rel="stylesheet" href="/fontawesome.css">"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/fontawesome.css"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);
    }
}
