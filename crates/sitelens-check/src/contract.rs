//! The contract every validation check implements.
//!
//! A check declares up front which named parameters it binds (a closed set),
//! receives a read-only [`CheckContext`] per run, and always returns a
//! [`CheckOutcome`] — internal failures are expressed as a `Verdict::Error`
//! outcome at the check boundary, never as a propagated error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitelens_core::{CheckId, CheckOutcome};
use std::collections::HashMap;
use std::fmt;

/// The closed set of named parameters a check may declare.
///
/// Declared explicitly on the descriptor at registration time; the
/// orchestrator binds only parameters a check actually asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckParam {
    /// The target URL under audit
    Url,
    /// Workspace name from the caller's extra context
    WorkspaceName,
    /// Repository slug from the caller's extra context
    RepoSlug,
}

impl CheckParam {
    /// The context key this parameter binds from.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::WorkspaceName => "workspace_name",
            Self::RepoSlug => "repo_slug",
        }
    }
}

impl fmt::Display for CheckParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The per-run input a check receives. Read-only to checks.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    url: Option<String>,
    extra: HashMap<String, String>,
}

impl CheckContext {
    /// Create a context for the given target URL.
    #[must_use]
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            extra: HashMap::new(),
        }
    }

    /// Attach an extra named argument.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The target URL, when one was supplied.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Look up an extra named argument.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// Immutable description of one registered check.
#[derive(Debug, Clone)]
pub struct CheckDescriptor {
    id: CheckId,
    params: Vec<CheckParam>,
}

impl CheckDescriptor {
    /// Create a descriptor with the given ID and declared parameters.
    #[must_use]
    pub fn new(id: CheckId, params: Vec<CheckParam>) -> Self {
        Self { id, params }
    }

    /// The check's identifier.
    #[must_use]
    pub fn id(&self) -> &CheckId {
        &self.id
    }

    /// The parameters this check declared.
    #[must_use]
    pub fn params(&self) -> &[CheckParam] {
        &self.params
    }

    /// Whether this check declared the given parameter.
    #[must_use]
    pub fn requires(&self, param: CheckParam) -> bool {
        self.params.contains(&param)
    }

    /// Whether the context satisfies this check's hard requirements.
    ///
    /// A check that declared `Url` cannot run without a caller-supplied URL.
    /// Extra-context parameters are soft: absent values simply stay unbound.
    #[must_use]
    pub fn runnable_with(&self, ctx: &CheckContext) -> bool {
        !(self.requires(CheckParam::Url) && ctx.url().is_none())
    }
}

/// A validation check: a descriptor plus a concurrently-invocable entry point.
///
/// `run` is infallible by contract. A check converts its internal error
/// taxonomy into a `Verdict::Error` (or check-specific verdict) outcome at
/// its own boundary.
#[async_trait]
pub trait Check: Send + Sync {
    /// The immutable descriptor for this check.
    fn descriptor(&self) -> &CheckDescriptor;

    /// Run the check once against the supplied context.
    async fn run(&self, ctx: &CheckContext) -> CheckOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitelens_core::Verdict;

    struct EchoCheck {
        descriptor: CheckDescriptor,
    }

    #[async_trait]
    impl Check for EchoCheck {
        fn descriptor(&self) -> &CheckDescriptor {
            &self.descriptor
        }

        async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
            CheckOutcome::new(
                self.descriptor.id().clone(),
                Verdict::Approved,
                ctx.url().unwrap_or("no url").to_string(),
            )
        }
    }

    #[test]
    fn test_param_keys() {
        assert_eq!(CheckParam::Url.key(), "url");
        assert_eq!(CheckParam::WorkspaceName.key(), "workspace_name");
        assert_eq!(CheckParam::RepoSlug.key(), "repo_slug");
    }

    #[test]
    fn test_descriptor_requires() {
        let descriptor = CheckDescriptor::new(
            CheckId::new("http_status").expect("valid check ID"),
            vec![CheckParam::Url],
        );
        assert!(descriptor.requires(CheckParam::Url));
        assert!(!descriptor.requires(CheckParam::RepoSlug));
    }

    #[test]
    fn test_runnable_with_url_requirement() {
        let needs_url = CheckDescriptor::new(
            CheckId::new("http_status").expect("valid check ID"),
            vec![CheckParam::Url],
        );
        let no_url_needed = CheckDescriptor::new(
            CheckId::new("repo_meta").expect("valid check ID"),
            vec![CheckParam::RepoSlug],
        );

        let without_url = CheckContext::new(None);
        let with_url = CheckContext::new(Some("https://example.com".to_string()));

        assert!(!needs_url.runnable_with(&without_url));
        assert!(needs_url.runnable_with(&with_url));
        assert!(no_url_needed.runnable_with(&without_url));
    }

    #[test]
    fn test_context_extra_lookup() {
        let ctx = CheckContext::new(Some("https://example.com".to_string()))
            .with_extra("workspace_name", "acme");
        assert_eq!(ctx.get("workspace_name"), Some("acme"));
        assert_eq!(ctx.get("repo_slug"), None);
    }

    #[tokio::test]
    async fn test_check_trait_object() {
        let check: Box<dyn Check> = Box::new(EchoCheck {
            descriptor: CheckDescriptor::new(
                CheckId::new("echo_check").expect("valid check ID"),
                vec![CheckParam::Url],
            ),
        });

        let ctx = CheckContext::new(Some("https://example.com".to_string()));
        let outcome = check.run(&ctx).await;
        assert_eq!(outcome.module.as_str(), "echo_check");
        assert_eq!(outcome.result, Verdict::Approved);
    }
}
