//! Policy-wrapped HTTP client.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use url::Url;

use crate::client::error::{ClientError, ClientResult};
use crate::client::transport::{Transport, UpstreamRequest, UpstreamResponse};
use crate::resilience::Pipeline;

/// A pre-wired HTTP client: base URL, optional bearer token, and a
/// retry + circuit-breaker pipeline around every request.
///
/// Cloning is cheap; clones share the same transport and the same breaker
/// state. Distinct registered clients never share either.
#[derive(Clone)]
pub struct ResilientClient {
    inner: Arc<Inner>,
}

struct Inner {
    label: String,
    base_url: Option<Url>,
    auth_token: Option<String>,
    transport: Arc<dyn Transport>,
    pipeline: Pipeline,
}

impl ResilientClient {
    pub(crate) fn new(
        label: impl Into<String>,
        base_url: Option<Url>,
        auth_token: Option<String>,
        transport: Arc<dyn Transport>,
        pipeline: Pipeline,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                label: label.into(),
                base_url,
                auth_token,
                transport,
                pipeline,
            }),
        }
    }

    /// Logical name (or contract id) this client was registered under.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Configured base URL, if any.
    pub fn base_url(&self) -> Option<&Url> {
        self.inner.base_url.as_ref()
    }

    /// The resilience pipeline guarding this client.
    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// GET `path` relative to the base URL.
    pub async fn get(&self, path: &str) -> ClientResult<UpstreamResponse> {
        self.send(Method::GET, path, None).await
    }

    /// POST `body` to `path` relative to the base URL.
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<Vec<u8>>,
    ) -> ClientResult<UpstreamResponse> {
        self.send(Method::POST, path, Some(body.into())).await
    }

    /// Dispatch a request through the resilience pipeline.
    ///
    /// The response is returned only for 2xx statuses; anything else comes
    /// back as [`ClientError::Status`] so the pipeline can classify it.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> ClientResult<UpstreamResponse> {
        let url = self.resolve_url(path)?;
        let mut request = UpstreamRequest::new(method, url);
        if let Some(token) = &self.inner.auth_token {
            request
                .headers
                .push(("authorization".to_string(), format!("Bearer {token}")));
        }
        request.body = body;

        let transport = Arc::clone(&self.inner.transport);
        self.inner
            .pipeline
            .execute(move || {
                let transport = Arc::clone(&transport);
                let request = request.clone();
                async move {
                    let response = transport.send(request).await?;
                    if response.status.is_success() {
                        Ok(response)
                    } else {
                        Err(ClientError::Status(response.status))
                    }
                }
            })
            .await
    }

    fn resolve_url(&self, path: &str) -> ClientResult<Url> {
        match &self.inner.base_url {
            Some(base) => base
                .join(path)
                .map_err(|e| ClientError::Url(format!("cannot join '{path}': {e}"))),
            None => Url::parse(path)
                .map_err(|e| ClientError::Url(format!("'{path}' is not an absolute URL: {e}"))),
        }
    }
}

impl fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("label", &self.inner.label)
            .field("base_url", &self.inner.base_url)
            .field("has_auth_token", &self.inner.auth_token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{CircuitBreakerPolicy, RetryPolicy};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Transport fake that replays a scripted sequence of outcomes and
    /// records every request it sees.
    struct ScriptedTransport {
        outcomes: Mutex<Vec<ClientResult<UpstreamResponse>>>,
        calls: AtomicU32,
        seen: Mutex<Vec<UpstreamRequest>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<ClientResult<UpstreamResponse>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn ok(status: u16) -> ClientResult<UpstreamResponse> {
            Ok(UpstreamResponse {
                status: StatusCode::from_u16(status).unwrap(),
                body: Vec::new(),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: UpstreamRequest) -> ClientResult<UpstreamResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request);
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                Self::ok(200)
            } else {
                outcomes.remove(0)
            }
        }
    }

    fn client(transport: Arc<ScriptedTransport>, token: Option<&str>) -> ResilientClient {
        ResilientClient::new(
            "test",
            Some(Url::parse("http://upstream.local/api/").unwrap()),
            token.map(String::from),
            transport,
            Pipeline::new(
                RetryPolicy::new(2),
                CircuitBreakerPolicy::new(2, Duration::from_secs(10)).build(),
            ),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_path_against_base_url() {
        let transport = ScriptedTransport::new(vec![]);
        let c = client(transport.clone(), None);
        c.get("widgets").await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url.as_str(), "http://upstream.local/api/widgets");
        assert_eq!(seen[0].method, Method::GET);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bearer_token_attached_to_every_request() {
        let transport = ScriptedTransport::new(vec![]);
        let c = client(transport.clone(), Some("s3cr3t"));
        c.get("widgets").await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert!(seen[0]
            .headers
            .iter()
            .any(|(k, v)| k == "authorization" && v == "Bearer s3cr3t"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_5xx_retried_until_success() {
        let transport = ScriptedTransport::new(vec![
            ScriptedTransport::ok(503),
            ScriptedTransport::ok(503),
            ScriptedTransport::ok(200),
        ]);
        let c = client(transport.clone(), None);
        let response = c.get("widgets").await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_4xx_not_retried() {
        let transport = ScriptedTransport::new(vec![ScriptedTransport::ok(404)]);
        let c = client(transport.clone(), None);
        let result = c.get("widgets").await;
        assert!(matches!(result, Err(ClientError::Status(s)) if s == StatusCode::NOT_FOUND));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_fails_fast_after_threshold() {
        let transport = ScriptedTransport::new(vec![
            // Two requests, each exhausting 1 + 2 attempts.
            ScriptedTransport::ok(500),
            ScriptedTransport::ok(500),
            ScriptedTransport::ok(500),
            ScriptedTransport::ok(500),
            ScriptedTransport::ok(500),
            ScriptedTransport::ok(500),
        ]);
        let c = client(transport.clone(), None);
        assert!(c.get("widgets").await.is_err());
        assert!(c.get("widgets").await.is_err());
        assert_eq!(transport.calls(), 6);

        // Third request fails fast without reaching the transport.
        let result = c.get("widgets").await;
        assert!(matches!(result, Err(ClientError::BreakerOpen)));
        assert_eq!(transport.calls(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_base_url_requires_absolute_path() {
        let transport = ScriptedTransport::new(vec![]);
        let c = ResilientClient::new(
            "bare",
            None,
            None,
            transport,
            Pipeline::new(
                RetryPolicy::standard(),
                CircuitBreakerPolicy::standard(Duration::from_secs(10)).build(),
            ),
        );
        let result = c.get("widgets").await;
        assert!(matches!(result, Err(ClientError::Url(_))));

        c.get("http://other.local/x").await.unwrap();
    }
}
