use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

/// A viewport size to emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Headless browser engine for rendering-dependent checks.
pub struct BrowserEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserEngine {
    /// Launch a browser instance.
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder().no_sandbox();
        if !headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // Drive CDP events until the browser goes away
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        debug!(headless, "browser launched");

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a page and wait for navigation to settle.
    pub async fn open(&self, url: &str) -> Result<PageHandle> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        page.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(PageHandle { page })
    }

    /// Close the browser and stop the event handler.
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        self.handler_task.abort();
        Ok(())
    }
}

/// One open page, ready for viewport emulation and script probes.
pub struct PageHandle {
    page: Page,
}

impl PageHandle {
    /// Emulate the given viewport size.
    pub async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(BrowserError::Chromium)?;

        self.page
            .execute(params)
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        Ok(())
    }

    /// Reload the page so layout reflects the current viewport.
    pub async fn reload(&self) -> Result<()> {
        self.page
            .reload()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        Ok(())
    }

    /// Evaluate a script returning an optional string.
    pub async fn evaluate_string(&self, js: &str) -> Result<Option<String>> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;

        result
            .into_value()
            .map_err(|e| BrowserError::Evaluation(e.to_string()))
    }
}
