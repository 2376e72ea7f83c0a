//! Checks that below-the-fold footer images are lazy-loaded.

use crate::descriptor_for;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::json;
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use sitelens_fetch::Fetcher;
use std::time::Duration;

/// Requires `loading="lazy"` on every image inside the page footer.
/// Footers render below the fold; eager images there cost first paint
/// for nothing.
pub struct FooterLazyLoadCheck {
    descriptor: CheckDescriptor,
    timeout: Duration,
}

impl FooterLazyLoadCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("footer_lazy_load", &[CheckParam::Url]),
            timeout: Duration::from_secs(cfg.fetch.request_timeout_secs),
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }
}

enum FooterImages {
    NoFooter,
    NoImages,
    Assessed { total: usize, eager: Vec<String> },
}

fn assess_footer(html: &str) -> FooterImages {
    let document = Html::parse_document(html);
    let footers = Selector::parse("footer, #footer, .footer").expect("static selector parses");
    let images = Selector::parse("img").expect("static selector parses");

    let Some(footer) = document.select(&footers).next() else {
        return FooterImages::NoFooter;
    };

    let mut total = 0;
    let mut eager = Vec::new();
    for img in footer.select(&images) {
        total += 1;
        let lazy = img
            .value()
            .attr("loading")
            .is_some_and(|value| value.eq_ignore_ascii_case("lazy"));
        if !lazy {
            let src = img.value().attr("src").unwrap_or("(no src)");
            eager.push(src.to_string());
        }
    }

    if total == 0 {
        FooterImages::NoImages
    } else {
        FooterImages::Assessed { total, eager }
    }
}

#[async_trait]
impl Check for FooterLazyLoadCheck {
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

        match assess_footer(&body) {
            FooterImages::NoFooter => self.outcome(Verdict::Approved, "page has no footer"),
            FooterImages::NoImages => self.outcome(Verdict::Approved, "footer has no images"),
            FooterImages::Assessed { total, eager } if eager.is_empty() => self.outcome(
                Verdict::Approved,
                format!("all {total} footer images are lazy-loaded"),
            ),
            FooterImages::Assessed { total, eager } => self.outcome(
                Verdict::Rejected,
                Details::findings(vec![
                    ("footer_images", json!(total)),
                    ("eager_count", json!(eager.len())),
                    ("eager", json!(eager)),
                ]),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_assess_footer_variants() {
        assert!(matches!(
            assess_footer("<body><p>no footer</p></body>"),
            FooterImages::NoFooter
        ));
        assert!(matches!(
            assess_footer("<footer><p>text</p></footer>"),
            FooterImages::NoImages
        ));

        let all_lazy = assess_footer(
            r#"<footer><img src="/a.png" loading="lazy"><img src="/b.png" loading="LAZY"></footer>"#,
        );
        match all_lazy {
            FooterImages::Assessed { total, eager } => {
                assert_eq!(total, 2);
                assert!(eager.is_empty());
            }
            _ => panic!("expected assessed footer"),
        }

        let mixed = assess_footer(
            r#"<footer><img src="/a.png" loading="lazy"><img src="/b.png"></footer>"#,
        );
        match mixed {
            FooterImages::Assessed { total, eager } => {
                assert_eq!(total, 2);
                assert_eq!(eager, vec!["/b.png".to_string()]);
            }
            _ => panic!("expected assessed footer"),
        }
    }

    #[test]
    fn test_assess_footer_class_container() {
        let result = assess_footer(r#"<div class="footer"><img src="/x.png"></div>"#);
        assert!(matches!(
            result,
            FooterImages::Assessed { total: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_eager_footer_image_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<footer><img src="/map.png"></footer>"#,
            ))
            .mount(&server)
            .await;

        let check = FooterLazyLoadCheck::new(&AuditConfig::default());
        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check.run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Rejected);
    }

    #[tokio::test]
    async fn test_lazy_footer_approved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<footer><img src="/map.png" loading="lazy"></footer>"#,
            ))
            .mount(&server)
            .await;

        let check = FooterLazyLoadCheck::new(&AuditConfig::default());
        let ctx = CheckContext::new(Some(format!("{}/", server.uri())));
        let outcome = check.run(&ctx).await;
        assert_eq!(outcome.result, Verdict::Approved);
    }
}
