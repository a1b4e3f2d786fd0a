use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::config::HttpConfig;

/// Statuses that usually clear up on their own.
const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retries transient failures with exponential backoff.
///
/// The wait before retry `n` (1-based) is `backoff_factor * 2^(n-1)` seconds.
#[derive(Debug, Clone)]
pub struct Retrying<T> {
    inner: T,
    max_retries: u32,
    backoff_factor: f64,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            inner,
            max_retries,
            backoff_factor,
        }
    }

    pub fn from_config(inner: T, config: &HttpConfig) -> Self {
        Self::new(inner, config.max_retries, config.backoff_factor)
    }

    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16) as i32;
        let secs = (self.backoff_factor * 2f64.powi(exponent)).max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

#[async_trait]
impl<T: Transport> Transport for Retrying<T> {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut retry = 0;
        loop {
            let outcome = self.inner.get(request).await;

            let reason = match &outcome {
                Ok(res) if RETRY_STATUSES.contains(&res.status) => {
                    Some(format!("status {}", res.status))
                }
                Err(e) if e.is_transient() => Some(e.to_string()),
                _ => None,
            };
            let Some(reason) = reason else {
                return outcome;
            };

            if retry >= self.max_retries {
                warn!(url = %request.url, attempts = retry + 1, "Giving up after {reason}");
                return outcome;
            }

            retry += 1;
            let wait = self.backoff(retry);
            debug!(
                url = %request.url,
                "Retry {retry}/{} after {reason}, waiting {:.1}s",
                self.max_retries,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed list of outcomes, then keeps returning the last one.
    #[derive(Debug)]
    struct Scripted {
        outcomes: Mutex<Vec<Result<u16, &'static str>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<u16, &'static str>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn get(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;
            let mut outcomes = self.outcomes.lock().unwrap();
            let next = if outcomes.len() > 1 {
                outcomes.pop().unwrap()
            } else {
                outcomes[0]
            };
            match next {
                Ok(status) => Ok(HttpResponse {
                    status,
                    body: "{}".into(),
                }),
                Err(msg) => Err(TransportError::Network(msg.into())),
            }
        }
    }

    fn request() -> HttpRequest {
        HttpRequest::get("https://example.org/forecast")
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let scripted = Scripted::new(vec![Ok(503), Err("connection reset"), Ok(200)]);
        let transport = Retrying::new(scripted, 5, 0.0);

        let res = transport.get(&request()).await.unwrap();

        assert_eq!(res.status, 200);
        assert_eq!(transport.inner.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let transport = Retrying::new(Scripted::new(vec![Ok(502)]), 2, 0.0);

        let res = transport.get(&request()).await.unwrap();

        assert_eq!(res.status, 502);
        assert_eq!(transport.inner.calls(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let transport = Retrying::new(Scripted::new(vec![Ok(404)]), 5, 0.0);

        let res = transport.get(&request()).await.unwrap();

        assert_eq!(res.status, 404);
        assert_eq!(transport.inner.calls(), 1);
    }

    #[test]
    fn backoff_doubles() {
        let transport = Retrying::new((), 5, 0.2);
        assert_eq!(transport.backoff(1), Duration::from_secs_f64(0.2));
        assert_eq!(transport.backoff(2), Duration::from_secs_f64(0.4));
        assert_eq!(transport.backoff(3), Duration::from_secs_f64(0.8));
    }

    #[test]
    fn oversized_backoff_saturates() {
        let transport = Retrying::new((), 5, f64::MAX);
        assert_eq!(transport.backoff(3), Duration::MAX);

        let transport = Retrying::new((), 5, f64::INFINITY);
        assert_eq!(transport.backoff(1), Duration::MAX);
    }

    #[test]
    fn nan_backoff_waits_nothing() {
        let transport = Retrying::new((), 5, f64::NAN);
        assert_eq!(transport.backoff(1), Duration::ZERO);
    }
}
