//! Detects horizontal overflow across common viewport sizes.

use crate::descriptor_for;
use async_trait::async_trait;
use serde_json::json;
use sitelens_browser::{BrowserEngine, PageHandle, Viewport};
use sitelens_check::{Check, CheckContext, CheckDescriptor, CheckParam};
use sitelens_core::{AuditConfig, CheckOutcome, Details, Verdict};
use tracing::{debug, warn};

/// The viewport matrix every page is rendered at.
pub const VIEWPORTS: [(&str, Viewport); 3] = [
    ("desktop", Viewport { width: 1920, height: 1080 }),
    ("tablet", Viewport { width: 768, height: 1024 }),
    ("mobile", Viewport { width: 375, height: 667 }),
];

// Names the widest element protruding past the viewport, or null when
// the page fits.
const OVERFLOW_PROBE: &str = r"
(() => {
  const doc = document.documentElement;
  if (doc.scrollWidth <= window.innerWidth) return null;
  let worst = null;
  let max = window.innerWidth;
  for (const el of document.querySelectorAll('body *')) {
    const rect = el.getBoundingClientRect();
    if (rect.right > max) { max = rect.right; worst = el; }
  }
  if (!worst) return 'document';
  let name = worst.tagName.toLowerCase();
  if (worst.id) name += '#' + worst.id;
  else if (typeof worst.className === 'string' && worst.className.trim())
    name += '.' + worst.className.trim().split(/\s+/)[0];
  return name;
})()
";

/// Renders the page at desktop, tablet and mobile sizes and flags any
/// viewport where content forces a horizontal scrollbar.
pub struct LateralScrollCheck {
    descriptor: CheckDescriptor,
    headless: bool,
}

impl LateralScrollCheck {
    #[must_use]
    pub fn new(cfg: &AuditConfig) -> Self {
        Self {
            descriptor: descriptor_for("lateral_scroll", &[CheckParam::Url]),
            headless: cfg.browser.headless,
        }
    }

    fn outcome(&self, result: Verdict, details: impl Into<Details>) -> CheckOutcome {
        CheckOutcome::new(self.descriptor.id().clone(), result, details)
    }

    async fn probe_viewports(
        page: &PageHandle,
    ) -> Result<Vec<(String, String)>, sitelens_browser::BrowserError> {
        let mut violations = Vec::new();
        for (label, viewport) in VIEWPORTS {
            page.set_viewport(viewport).await?;
            page.reload().await?;
            match page.evaluate_string(OVERFLOW_PROBE).await? {
                Some(element) => {
                    debug!(label, element, "horizontal overflow detected");
                    violations.push((label.to_string(), element));
                }
                None => debug!(label, "no horizontal overflow"),
            }
        }
        Ok(violations)
    }
}

#[async_trait]
impl Check for LateralScrollCheck {
    fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let Some(url) = ctx.url() else {
            return self.outcome(Verdict::Error, "no target URL bound");
        };

        let engine = match BrowserEngine::launch(self.headless).await {
            Ok(engine) => engine,
            Err(e) => {
                return self.outcome(Verdict::Error, format!("browser unavailable: {e}"));
            }
        };

        let result = match engine.open(url).await {
            Ok(page) => Self::probe_viewports(&page).await,
            Err(e) => Err(e),
        };

        if let Err(e) = engine.close().await {
            warn!(error = %e, "browser did not close cleanly");
        }

        match result {
            Ok(violations) if violations.is_empty() => self.outcome(
                Verdict::Approved,
                "no lateral scroll at any tested viewport",
            ),
            Ok(violations) => {
                let mut map = serde_json::Map::new();
                for (label, element) in violations {
                    map.insert(label, json!(element));
                }
                self.outcome(Verdict::Rejected, Details::Findings(map))
            }
            Err(e) => self.outcome(Verdict::Error, format!("browser session failed: {e}")),
        }
    }
}
