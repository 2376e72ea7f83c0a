//! Probes the images on the target page for dead sources.

use crate::{descriptor_for, page};
use async_trait::async_trait;
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::Fetcher;
use std::time::Duration;
use url::Url;

/// Probes every `img` source on the page for liveness.
pub struct BrokenImagesCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
    concurrency: usize,
    transient_retries: u32,
}

impl BrokenImagesCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("broken_images", &[CheckParam::Url]),
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
impl Check for BrokenImagesCheck {
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

        let body = match fetcher.get_text(url).await {
            Ok(body) => body,
            Err(e) => {
                return self.outcome(Verdict::Error, format!("failed to load page: {e}"));
            }
        };

        let sources = page::extract_image_sources(&body, &base);
        if sources.is_empty() {
            return self.outcome(Verdict::Approved, "no images found on the page");
        }

        let total = sources.len();
        let results = fetcher.probe_all(sources).await;
        // An image is alive only on a plain 200; a 204 or an unfollowed
        // redirect means nothing renderable behind the src.
        let broken: Vec<String> = results
            .iter()
            .filter(|probe| !probe.is_ok())
            .map(|probe| match probe.status {
                Some(status) => format!("[{status}] -> {}", probe.url),
                None => format!("[unreachable] -> {}", probe.url),
            })
            .collect();

        if broken.is_empty() {
            self.outcome(
                Verdict::Approved,
                format!("{total} images checked, none broken"),
            )
        } else {
            self.outcome(
                Verdict::Rejected,
                Details::findings(vec![
                    ("total_images", json!(total)),
                    ("broken_count", json!(broken.len())),
                    ("broken", json!(broken)),
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

    fn check() -> BrokenImagesCheck {
        BrokenImagesCheck::new(&AuditConfig::default())
    }

    #[tokio::test]
    async fn test_live_images_approved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<img src="/hero.png"><img src="/logo.svg">"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Approved);
    }

    #[tokio::test]
    async fn test_missing_image_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<img src="/gone.png">"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);

        let Details::Findings(findings) = outcome.details else {
            panic!("expected structured findings");
        };
        assert_eq!(findings["broken_count"], json!(1));
    }

    #[tokio::test]
    async fn test_non_200_image_status_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<img src="/empty.png">"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/empty.png"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);

        let Details::Findings(findings) = outcome.details else {
            panic!("expected structured findings");
        };
        assert_eq!(findings["broken"][0], json!(format!("[204] -> {}/empty.png", server.uri())));
    }

    #[tokio::test]
    async fn test_page_without_images_approved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>text only</p>"))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Approved);
    }
}
