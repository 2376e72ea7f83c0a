//! Per-check HTTP fetcher with bounded concurrency and retry policies.

use crate::error::{categorize, FetchError, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::{redirect, Client, Method};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// HTTP statuses worth one more attempt before calling a link broken.
pub const TRANSIENT_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Pause between transient-status retry attempts.
const TRANSIENT_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Maximum redirects followed per request.
const REDIRECT_LIMIT: usize = 5;

/// Escalating timeout schedule for slow-target retries.
///
/// Each entry is the timeout for one attempt; a timed-out attempt moves on
/// to the next, longer entry. Only timeouts escalate — HTTP errors and
/// non-timeout connection failures are terminal on the first attempt.
#[derive(Debug, Clone)]
pub struct RetrySchedule(Vec<Duration>);

impl RetrySchedule {
    /// Create a schedule from explicit per-attempt timeouts.
    #[must_use]
    pub fn new(timeouts: Vec<Duration>) -> Self {
        Self(timeouts)
    }

    /// Create a schedule from per-attempt timeouts in seconds.
    #[must_use]
    pub fn from_secs(secs: &[u64]) -> Self {
        Self(secs.iter().copied().map(Duration::from_secs).collect())
    }

    /// The per-attempt timeouts.
    #[must_use]
    pub fn timeouts(&self) -> &[Duration] {
        &self.0
    }
}

impl Default for RetrySchedule {
    /// The observed production schedule: 15s, 20s, 40s, 60s.
    fn default() -> Self {
        Self::from_secs(&[15, 20, 40, 60])
    }
}

/// Outcome of probing one URL's liveness.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// The probed URL
    pub url: String,
    /// Final HTTP status; `None` means connection failure or timeout
    pub status: Option<u16>,
}

impl ProbeResult {
    /// Whether the probe indicates a broken link (4xx/5xx or unreachable).
    #[must_use]
    pub fn is_broken(&self) -> bool {
        matches!(self.status, None | Some(400..=599))
    }

    /// Whether the probe answered exactly HTTP 200.
    ///
    /// Stricter than the inverse of [`is_broken`](Self::is_broken): callers
    /// that require a plain OK (resource probes) must not accept 204/206 or
    /// an unfollowed redirect as alive.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Some(200)
    }
}

/// HTTP fetcher scoped to one check invocation.
///
/// Owns its own client and counting semaphore, sized at construction — no
/// cross-check shared state. Dropping the fetcher releases the connection
/// pool on every exit path.
pub struct Fetcher {
    client: Client,
    limiter: Arc<Semaphore>,
    timeout: Duration,
    transient_retries: u32,
}

impl Fetcher {
    /// Create a fetcher with the given concurrency cap and default timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(concurrency: usize, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(REDIRECT_LIMIT))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
            timeout,
            transient_retries: 1,
        })
    }

    /// Set the retry count for transient statuses (default 1).
    #[must_use]
    pub fn with_transient_retries(mut self, retries: u32) -> Self {
        self.transient_retries = retries;
        self
    }

    /// GET a page and return its body as text.
    ///
    /// Non-2xx statuses are returned as [`FetchError::Status`].
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let _permit = self.limiter.acquire().await.expect("acquire fetch permit");
        self.get_text_once(url, self.timeout).await
    }

    /// GET a page with the escalating timeout schedule.
    ///
    /// Retries on timeout only, with each attempt's timeout taken from the
    /// schedule; HTTP error statuses and non-timeout connection errors fail
    /// immediately.
    pub async fn get_text_with_schedule(
        &self,
        url: &str,
        schedule: &RetrySchedule,
    ) -> Result<String> {
        let _permit = self.limiter.acquire().await.expect("acquire fetch permit");

        let timeouts = schedule.timeouts();
        if timeouts.is_empty() {
            return self.get_text_once(url, self.timeout).await;
        }

        let last_index = timeouts.len() - 1;
        for (attempt, &timeout) in timeouts.iter().enumerate() {
            match self.get_text_once(url, timeout).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_timeout() && attempt < last_index => {
                    debug!(
                        url,
                        attempt = attempt + 1,
                        next_timeout = ?timeouts[attempt + 1],
                        "fetch timed out, escalating"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::Timeout)
    }

    /// GET a page with an explicit one-shot timeout.
    pub async fn get_text_with_timeout(&self, url: &str, timeout: Duration) -> Result<String> {
        let _permit = self.limiter.acquire().await.expect("acquire fetch permit");
        self.get_text_once(url, timeout).await
    }

    /// GET a resource and return its body as raw bytes.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let _permit = self.limiter.acquire().await.expect("acquire fetch permit");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| categorize(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| categorize(&e))?;
        Ok(bytes.to_vec())
    }

    /// GET a JSON endpoint with query parameters.
    ///
    /// Used for remote validator APIs; a non-success status is surfaced as
    /// [`FetchError::Status`] so the caller can report API unavailability.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        let _permit = self.limiter.acquire().await.expect("acquire fetch permit");

        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| categorize(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// HEAD a URL and return its final status (no retries).
    pub async fn head_status(&self, url: &str) -> Result<u16> {
        let _permit = self.limiter.acquire().await.expect("acquire fetch permit");

        let response = self
            .client
            .head(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| categorize(&e))?;

        Ok(response.status().as_u16())
    }

    /// Probe one URL's liveness with the transient-status retry policy.
    ///
    /// First attempt is a lightweight HEAD; retries fall back to GET for
    /// servers that mishandle HEAD. Only statuses in [`TRANSIENT_STATUSES`]
    /// are retried; anything else is the final answer. Connection failures
    /// and timeouts yield `status: None` without retrying.
    pub async fn probe_status(&self, url: &str) -> ProbeResult {
        let _permit = self.limiter.acquire().await.expect("acquire fetch permit");

        let mut last_status = None;

        for attempt in 0..=self.transient_retries {
            let method = if attempt == 0 { Method::HEAD } else { Method::GET };

            match self
                .client
                .request(method, url)
                .timeout(self.timeout)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !TRANSIENT_STATUSES.contains(&status) {
                        return ProbeResult {
                            url: url.to_string(),
                            status: Some(status),
                        };
                    }

                    last_status = Some(status);
                    if attempt < self.transient_retries {
                        warn!(url, status, "transient status, retrying");
                        tokio::time::sleep(TRANSIENT_RETRY_PAUSE).await;
                    }
                }
                Err(_) => {
                    return ProbeResult {
                        url: url.to_string(),
                        status: None,
                    };
                }
            }
        }

        ProbeResult {
            url: url.to_string(),
            status: last_status,
        }
    }

    /// Probe many URLs concurrently under this fetcher's semaphore.
    ///
    /// Results arrive in completion order; callers must key by URL, never
    /// by position.
    pub async fn probe_all(&self, urls: Vec<String>) -> Vec<ProbeResult> {
        let mut futures = FuturesUnordered::new();

        for url in urls {
            futures.push(async move { self.probe_status(&url).await });
        }

        let mut results = Vec::new();
        while let Some(result) = futures.next().await {
            results.push(result);
        }

        results
    }

    async fn get_text_once(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| categorize(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| categorize(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(5, Duration::from_secs(5)).expect("build fetcher")
    }

    #[test]
    fn test_default_schedule() {
        let schedule = RetrySchedule::default();
        assert_eq!(
            schedule.timeouts(),
            &[
                Duration::from_secs(15),
                Duration::from_secs(20),
                Duration::from_secs(40),
                Duration::from_secs(60)
            ]
        );
    }

    #[test]
    fn test_probe_result_is_broken() {
        let ok = ProbeResult {
            url: "https://a.test".to_string(),
            status: Some(200),
        };
        let not_found = ProbeResult {
            url: "https://a.test".to_string(),
            status: Some(404),
        };
        let unreachable = ProbeResult {
            url: "https://a.test".to_string(),
            status: None,
        };
        assert!(!ok.is_broken());
        assert!(not_found.is_broken());
        assert!(unreachable.is_broken());
    }

    #[test]
    fn test_probe_result_is_ok_requires_200() {
        let no_content = ProbeResult {
            url: "https://a.test".to_string(),
            status: Some(204),
        };
        let ok = ProbeResult {
            url: "https://a.test".to_string(),
            status: Some(200),
        };
        // 204 is not broken, but it is not a plain OK either
        assert!(!no_content.is_broken());
        assert!(!no_content.is_ok());
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let body = fetcher()
            .get_text(&format!("{}/page", server.uri()))
            .await
            .expect("fetch page");
        assert_eq!(body, "<html>hi</html>");
    }

    #[tokio::test]
    async fn test_get_text_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetcher().get_text(&format!("{}/missing", server.uri())).await;
        assert!(matches!(result, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn test_schedule_retries_timeout_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let schedule = RetrySchedule::new(vec![
            Duration::from_millis(50),
            Duration::from_secs(2),
        ]);
        let body = fetcher()
            .get_text_with_schedule(&format!("{}/slow", server.uri()), &schedule)
            .await
            .expect("second attempt succeeds");
        assert_eq!(body, "late");
    }

    #[tokio::test]
    async fn test_schedule_does_not_retry_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetcher()
            .get_text_with_schedule(&format!("{}/gone", server.uri()), &RetrySchedule::default())
            .await;
        assert!(matches!(result, Err(FetchError::Status(410))));
    }

    #[tokio::test]
    async fn test_schedule_exhausted_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stuck"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let schedule = RetrySchedule::new(vec![
            Duration::from_millis(30),
            Duration::from_millis(30),
        ]);
        let result = fetcher()
            .get_text_with_schedule(&format!("{}/stuck", server.uri()), &schedule)
            .await;
        assert!(matches!(result, Err(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn test_probe_retries_transient_status() {
        let server = MockServer::start().await;
        // First attempt is HEAD and hits a transient 503; the retry is a GET.
        Mock::given(method("HEAD"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let probe = fetcher().probe_status(&format!("{}/flaky", server.uri())).await;
        assert_eq!(probe.status, Some(200));
        assert!(!probe.is_broken());
    }

    #[tokio::test]
    async fn test_probe_terminal_status_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/dead"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let probe = fetcher().probe_status(&format!("{}/dead", server.uri())).await;
        assert_eq!(probe.status, Some(404));
        assert!(probe.is_broken());
    }

    #[tokio::test]
    async fn test_probe_connection_failure() {
        // Nothing listens on this port; the probe must degrade to None.
        let probe = fetcher().probe_status("http://127.0.0.1:9/unreachable").await;
        assert_eq!(probe.status, None);
        assert!(probe.is_broken());
    }

    #[tokio::test]
    async fn test_probe_all_collects_every_url() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let urls = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];
        let results = fetcher().probe_all(urls).await;

        assert_eq!(results.len(), 2);
        let broken: Vec<_> = results.iter().filter(|r| r.is_broken()).collect();
        assert_eq!(broken.len(), 1);
        assert!(broken[0].url.ends_with("/b"));
    }

    #[tokio::test]
    async fn test_get_json_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/validate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;

        let value = fetcher()
            .get_json(&format!("{}/validate", server.uri()), &[("out", "json")])
            .await
            .expect("fetch json");
        assert_eq!(value["messages"], serde_json::json!([]));
    }
}
