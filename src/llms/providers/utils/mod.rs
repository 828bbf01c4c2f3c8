//! Transport helpers shared by the HTTP adapters.
//!
//! [`post_json_with_retry`] is the retry loop every provider uses:
//! exponential backoff, `Retry-After` on 429, retry on 529 and 5xx,
//! immediate failure on any other 4xx.

use std::time::Duration;

use serde_json::Value;

use crate::evaluator::errors::GatewayError;

/// Shared HTTP knobs of an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportOptions {
    pub timeout_secs: f64,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 120.0,
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Build a reqwest client honouring the configured timeout.
pub fn build_client(provider: &str, options: &TransportOptions) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs_f64(options.timeout_secs))
        .build()
        .map_err(|e| GatewayError::Config {
            message: format!("{} HTTP client could not be built: {}", provider, e),
        })
}

/// Render an error with its whole source chain, so causes such as
/// "Connection refused" stay visible to the fatal classifier.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.contains(&text) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

/// First 500 characters of a body, for error messages.
pub fn excerpt(body: &str) -> String {
    body.chars().take(500).collect()
}

/// POST a JSON body, retrying transient failures, and return the parsed JSON reply.
///
/// `build` is called once per attempt since a `RequestBuilder` is consumed by `send`.
pub async fn post_json_with_retry<F>(
    provider: &str,
    options: &TransportOptions,
    build: F,
) -> Result<Value, GatewayError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<GatewayError> = None;
    let mut retry_delay = options.initial_backoff;

    for attempt in 0..=options.max_retries {
        if attempt > 0 {
            log::warn!("{} API retry attempt {} after {:?}", provider, attempt, retry_delay);
            tokio::time::sleep(retry_delay).await;
            retry_delay *= 2;
        }

        let response = match build().send().await {
            Ok(resp) => resp,
            Err(e) => {
                last_error = Some(GatewayError::Transport {
                    provider: provider.to_string(),
                    message: error_chain(&e),
                });
                continue;
            }
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if let Some(retry_after) = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
            {
                retry_delay = Duration::from_secs(retry_after);
            }
            last_error = Some(GatewayError::Http {
                provider: provider.to_string(),
                status: status.as_u16(),
                body: format!("Rate limited by {} API", provider),
            });
            continue;
        }

        if status.as_u16() == 529 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            last_error = Some(GatewayError::Http {
                provider: provider.to_string(),
                status: status.as_u16(),
                body: excerpt(&body),
            });
            continue;
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                last_error = Some(GatewayError::Transport {
                    provider: provider.to_string(),
                    message: error_chain(&e),
                });
                continue;
            }
        };

        if status.is_client_error() {
            return Err(GatewayError::Http {
                provider: provider.to_string(),
                status: status.as_u16(),
                body: excerpt(&text),
            });
        }

        return serde_json::from_str(&text).map_err(|e| GatewayError::InvalidResponse {
            provider: provider.to_string(),
            message: format!("{} - Body: {}", e, excerpt(&text)),
        });
    }

    Err(last_error.unwrap_or_else(|| GatewayError::Transport {
        provider: provider.to_string(),
        message: "request was never attempted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::errors::ErrorKind;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_surfaces_cause() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused"));
        let text = error_chain(&err);
        assert_eq!(text, "error sending request: Connection refused");
        let gateway = GatewayError::Transport { provider: "Ollama".into(), message: text };
        assert_eq!(gateway.kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_excerpt_limits_chars() {
        assert_eq!(excerpt(&"é".repeat(600)).chars().count(), 500);
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_transport_error() {
        let options = TransportOptions {
            timeout_secs: 2.0,
            max_retries: 0,
            initial_backoff: Duration::from_millis(1),
        };
        let client = build_client("Test", &options).unwrap();
        // Port 9 on localhost is the discard port; nothing listens there in CI.
        let result = post_json_with_retry("Test", &options, || client.post("http://127.0.0.1:9/")).await;
        assert!(matches!(result, Err(GatewayError::Transport { .. })));
    }
}
