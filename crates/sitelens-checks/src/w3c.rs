//! Remote W3C markup and stylesheet validation.

use crate::descriptor_for;
use async_trait::async_trait;
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::{FetchError, Fetcher};
use std::time::Duration;

/// Public Nu HTML checker endpoint.
const NU_ENDPOINT: &str = "https://validator.w3.org/nu/";

/// Public Jigsaw CSS validator endpoint.
const JIGSAW_ENDPOINT: &str = "https://jigsaw.w3.org/css-validator/validator";

/// Findings carry at most this many sample messages.
const SAMPLE_LIMIT: usize = 5;

fn validation_verdict(
    check: &CheckDescriptor,
    errors: usize,
    warnings: usize,
    samples: Vec<String>,
) -> CheckOutcome {
    if errors > 0 {
        CheckOutcome::new(
            check.id().clone(),
            Verdict::Rejected,
            Details::findings(vec![
                ("errors", json!(errors)),
                ("warnings", json!(warnings)),
                ("sample", json!(samples)),
            ]),
        )
    } else if warnings > 0 {
        CheckOutcome::new(
            check.id().clone(),
            Verdict::Attention,
            Details::findings(vec![
                ("errors", json!(0)),
                ("warnings", json!(warnings)),
                ("sample", json!(samples)),
            ]),
        )
    } else {
        CheckOutcome::new(
            check.id().clone(),
            Verdict::Approved,
            "no validation errors or warnings",
        )
    }
}

fn api_failure(check: &CheckDescriptor, error: &FetchError) -> CheckOutcome {
    let details = match error {
        FetchError::Status(status) => format!("validator API unavailable: HTTP {status}"),
        other => format!("validator API request failed: {other}"),
    };
    CheckOutcome::new(check.id().clone(), Verdict::Error, details)
}

/// Validates the page's markup against the W3C Nu HTML checker.
pub struct W3cHtmlCheck {
    descriptor: CheckDescriptor,
    endpoint: String,
    timeout: Duration,
    concurrency: usize,
}

impl W3cHtmlCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("w3c_html_validation", &[CheckParam::Url]),
            endpoint: NU_ENDPOINT.to_string(),
            timeout: Duration::from_secs(cfg.fetch.validator_timeout_secs),
            concurrency: cfg.fetch.validator_concurrency,
        }
    }

    /// Point the check at a different validator endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Check for W3cHtmlCheck {
    fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(url) = ctx.url() else {
            return CheckOutcome::new(
                self.descriptor.id().clone(),
                Verdict::Error,
                "no target URL bound",
            );
        };

        let fetcher = match Fetcher::new(self.concurrency, self.timeout) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                return CheckOutcome::new(
                    self.descriptor.id().clone(),
                    Verdict::Error,
                    format!("http client error: {e}"),
                )
            }
        };

        let response = match fetcher
            .get_json(&self.endpoint, &[("doc", url), ("out", "json")])
            .await
        {
            Ok(response) => response,
            Err(e) => return api_failure(&self.descriptor, &e),
        };

        let empty = Vec::new();
        let messages = response["messages"].as_array().unwrap_or(&empty);

        let mut errors = 0;
        let mut warnings = 0;
        let mut samples = Vec::new();
        for message in messages {
            let kind = message["type"].as_str().unwrap_or_default();
            let sub_kind = message["subType"].as_str().unwrap_or_default();
            let is_error = kind == "error";
            let is_warning = kind == "info" && sub_kind == "warning";
            if !is_error && !is_warning {
                continue;
            }
            if is_error {
                errors += 1;
            } else {
                warnings += 1;
            }
            if samples.len() < SAMPLE_LIMIT {
                let line = message["lastLine"].as_u64().unwrap_or(0);
                let text = message["message"].as_str().unwrap_or("(no message)");
                samples.push(format!("line {line}: {text}"));
            }
        }

        validation_verdict(&self.descriptor, errors, warnings, samples)
    }
}

/// Validates the page's stylesheets against the W3C Jigsaw CSS validator.
pub struct W3cCssCheck {
    descriptor: CheckDescriptor,
    endpoint: String,
    timeout: Duration,
    concurrency: usize,
}

impl W3cCssCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("w3c_css_validation", &[CheckParam::Url]),
            endpoint: JIGSAW_ENDPOINT.to_string(),
            timeout: Duration::from_secs(cfg.fetch.validator_timeout_secs),
            concurrency: cfg.fetch.validator_concurrency,
        }
    }

    /// Point the check at a different validator endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Check for W3cCssCheck {
    fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(url) = ctx.url() else {
            return CheckOutcome::new(
                self.descriptor.id().clone(),
                Verdict::Error,
                "no target URL bound",
            );
        };

        let fetcher = match Fetcher::new(self.concurrency, self.timeout) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                return CheckOutcome::new(
                    self.descriptor.id().clone(),
                    Verdict::Error,
                    format!("http client error: {e}"),
                )
            }
        };

        let response = match fetcher
            .get_json(
                &self.endpoint,
                &[
                    ("uri", url),
                    ("profile", "css3"),
                    ("output", "json"),
                    ("medium", "all"),
                ],
            )
            .await
        {
            Ok(response) => response,
            Err(e) => return api_failure(&self.descriptor, &e),
        };

        let validation = &response["cssvalidation"];
        #[allow(clippy::cast_possible_truncation)]
        let errors = validation["result"]["errorcount"].as_u64().unwrap_or(0) as usize;
        #[allow(clippy::cast_possible_truncation)]
        let warnings = validation["result"]["warningcount"].as_u64().unwrap_or(0) as usize;

        let empty = Vec::new();
        let reported = if errors > 0 {
            validation["errors"].as_array().unwrap_or(&empty)
        } else {
            validation["warnings"].as_array().unwrap_or(&empty)
        };
        let samples: Vec<String> = reported
            .iter()
            .take(SAMPLE_LIMIT)
            .map(|entry| {
                let line = entry["line"].as_u64().unwrap_or(0);
                let text = entry["message"].as_str().unwrap_or("(no message)").trim();
                format!("line {line}: {text}")
            })
            .collect();

        validation_verdict(&self.descriptor, errors, warnings, samples)
    }
}
