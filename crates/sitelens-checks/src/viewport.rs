//! Checks the responsive viewport meta tag.

use crate::descriptor_for;
use async_trait::async_trait;
use scraper::{Html, Selector};
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::Fetcher;
use std::time::Duration;

/// Verifies the page declares `meta name=viewport` with
/// `width=device-width` and `initial-scale=1`.
pub struct ViewportCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
}

impl ViewportCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("viewport_check", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }
}

fn viewport_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let meta = Selector::parse(r#"meta[name="viewport"]"#).expect("static selector parses");
    document
        .select(&meta)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(str::to_string)
}

// The tag's content is a comma-separated key=value list.
fn assess_content(content: &str) -> Result<(), String> {
    let mut device_width = false;
    let mut initial_scale = false;

    for directive in content.split(',') {
        let mut parts = directive.splitn(2, '=');
        let key = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let value = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        match key.as_str() {
            "width" if value == "device-width" => device_width = true,
            "initial-scale" if value == "1" || value == "1.0" => initial_scale = true,
            _ => {}
        }
    }

    match (device_width, initial_scale) {
        (true, true) => Ok(()),
        (false, _) => Err("viewport content is missing width=device-width".to_string()),
        (_, false) => Err("viewport content is missing initial-scale=1".to_string()),
    }
}

#[async_trait]
impl Check for ViewportCheck {
    fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(url) = ctx.url() else {
            return self.outcome(Verdict::Error, "no target URL bound");
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

        let Some(content) = viewport_content(&body) else {
            return self.outcome(Verdict::Rejected, "viewport meta tag not found");
        };

        match assess_content(&content) {
            Ok(()) => self.outcome(
                Verdict::Approved,
                format!("viewport meta tag correctly configured: {content}"),
            ),
            Err(reason) => self.outcome(Verdict::Rejected, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_assess_content_variants() {
        assert!(assess_content("width=device-width, initial-scale=1.0").is_ok());
        assert!(assess_content("initial-scale=1,width=device-width").is_ok());
        assert!(assess_content("width=device-width, initial-scale=1.0, user-scalable=no").is_ok());

        assert!(assess_content("width=1024, initial-scale=1.0").is_err());
        assert!(assess_content("width=device-width").is_err());
        assert!(assess_content("width=device-width, initial-scale=2").is_err());
    }

    #[test]
    fn test_viewport_content_extraction() {
        let html = r#"<head><meta name="viewport" content="width=device-width, initial-scale=1.0"></head>"#;
        assert_eq!(
            viewport_content(html),
            Some("width=device-width, initial-scale=1.0".to_string())
        );
        assert_eq!(viewport_content("<head></head>"), None);
    }

    #[tokio::test]
    async fn test_configured_page_approved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<head><meta name="viewport" content="width=device-width, initial-scale=1.0"></head>"#,
            ))
            .mount(&server)
            .await;

        let check = ViewportCheck::new(&AuditConfig::default());
        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check.run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Approved);
    }

    #[tokio::test]
    async fn test_missing_tag_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<head></head>"))
            .mount(&server)
            .await;

        let check = ViewportCheck::new(&AuditConfig::default());
        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check.run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);
        assert_eq!(
            outcome.details,
            Details::Text("viewport meta tag not found".to_string())
        );
    }
}
