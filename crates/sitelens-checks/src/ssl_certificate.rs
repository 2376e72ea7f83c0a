//! Validates the target's TLS certificate by completing a handshake.

use crate::descriptor_for;
use async_trait::async_trait;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Verdict};
use sitelens_fetch::{FetchError, Fetcher};
use std::time::Duration;
use url::Url;

/// Verifies that an HTTPS target presents a certificate the TLS stack
/// accepts. Any completed request — whatever its status — proves the
/// handshake succeeded.
pub struct SslCertificateCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
}

impl SslCertificateCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("ssl_certificate", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<sitelens_core::Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }
}

#[async_trait]
impl Check for SslCertificateCheck {
    fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(url) = ctx.url() else {
            return self.outcome(Verdict::Error, "no target URL bound");
        };

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return self.outcome(Verdict::Error, format!("invalid URL: {e}")),
        };
        if parsed.scheme() != "https" {
            return self.outcome(Verdict::NotApplicable, "URL does not use HTTPS");
        }

        let fetcher = match Fetcher::new(1, self.timeout) {
            Ok(fetcher) => fetcher,
            Err(e) => return self.outcome(Verdict::Error, format!("http client error: {e}")),
        };

        match fetcher.head_status(url).await {
            Ok(_) => self.outcome(Verdict::Approved, "SSL certificate accepted by handshake"),
            Err(FetchError::Ssl(reason)) => {
                self.outcome(Verdict::Rejected, format!("SSL certificate error: {reason}"))
            }
            Err(e @ (FetchError::Timeout | FetchError::Dns(_) | FetchError::Connect(_))) => {
                self.outcome(Verdict::Rejected, format!("could not reach host: {e}"))
            }
            Err(e) => self.outcome(Verdict::Error, format!("request failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check() -> SslCertificateCheck {
        SslCertificateCheck::new(&AuditConfig::default())
    }

    #[tokio::test]
    async fn test_plain_http_not_applicable() {
        let ctx = CheckContext::new(Some("http://example.com/".to_string()));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::NotApplicable);
    }

    #[tokio::test]
    async fn test_invalid_url_is_error() {
        let ctx = CheckContext::new(Some("not a url".to_string()));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Error);
    }

    #[tokio::test]
    async fn test_unreachable_https_host_rejected() {
        // TLS never starts; the host itself cannot be reached.
        let ctx = CheckContext::new(Some("https://127.0.0.1:9/".to_string()));
        let outcome = check().run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);
    }
}
