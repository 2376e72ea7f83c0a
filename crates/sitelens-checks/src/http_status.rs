//! Checks that the target URL answers with a healthy HTTP status.

use crate::descriptor_for;
use async_trait::async_trait;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Verdict};
use sitelens_fetch::Fetcher;
use std::time::Duration;

/// Probes the target URL and approves it only when it answers exactly 200.
pub struct HttpStatusCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
    transient_retries: u32,
}

impl HttpStatusCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("http_status", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
            transient_retries: cfg.fetch.transient_retries,
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<sitelens_core::Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }
}

#[async_trait]
impl Check for HttpStatusCheck {
    fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(url) = ctx.url() else {
            return self.outcome(Verdict::Error, "no target URL bound");
        };

        let fetcher = match Fetcher::new(1, self.timeout) {
            Ok(fetcher) => fetcher.with_transient_retries(self.transient_retries),
            Err(e) => return self.outcome(Verdict::Error, format!("http client error: {e}")),
        };

        let probe = fetcher.probe_status(url).await;
        match probe.status {
            Some(200) => self.outcome(Verdict::Approved, "Status code: 200"),
            Some(status) => self.outcome(Verdict::Rejected, format!("Status code: {status}")),
            None => self.outcome(Verdict::Rejected, "site unreachable (connection failure or timeout)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn check() -> HttpStatusCheck {
        HttpStatusCheck::new(&AuditConfig::default())
    }

    #[tokio::test]
    async fn test_healthy_site_approved() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(server.uri()));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Approved);
    }

    #[tokio::test]
    async fn test_client_error_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(server.uri()));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);
    }

    #[tokio::test]
    async fn test_non_200_success_status_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let ctx = CheckContext::new(Some(server.uri()));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);
    }

    #[tokio::test]
    async fn test_unreachable_rejected() {
        let ctx = CheckContext::new(Some("http://127.0.0.1:9/".to_string()));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);
    }

    #[tokio::test]
    async fn test_missing_url_is_error() {
        let outcome = check().run(&CheckContext::new(None)).await;
        assert_eq!(outcome.result, Verdict::Error);
    }
}
