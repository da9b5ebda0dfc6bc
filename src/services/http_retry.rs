//! HTTP retry with exponential backoff.
//!
//! Retries 429s, 5xx server errors, and network timeouts/connect failures.
//! Other 4xx statuses are non-retriable. Rate-limit backoff starts one step
//! longer than server-error backoff because the quota needs time to reset.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::warn;

/// Whether (and how long) a failed attempt should back off before retrying.
enum Verdict {
    Retry(Duration),
    GiveUp,
}

fn classify_status(status: StatusCode, attempt: u32) -> Verdict {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Verdict::Retry(Duration::from_secs(2u64.pow(attempt + 1)))
    } else if status.is_server_error() {
        Verdict::Retry(Duration::from_secs(2u64.pow(attempt)))
    } else {
        Verdict::GiveUp
    }
}

/// Send a request with up to `max_attempts` tries.
///
/// Returns `Some(response)` on the first success, `None` once attempts are
/// exhausted or a non-retriable error occurs. `context` labels log lines.
pub async fn send_with_backoff<F>(
    client: &Client,
    build_request: F,
    max_attempts: u32,
    context: &str,
) -> Option<Response>
where
    F: Fn(&Client) -> RequestBuilder,
{
    for attempt in 0..max_attempts {
        match build_request(client).send().await {
            Ok(resp) if resp.status().is_success() => return Some(resp),
            Ok(resp) => match classify_status(resp.status(), attempt) {
                Verdict::Retry(delay) => {
                    warn!(
                        context,
                        status = %resp.status(),
                        ?delay,
                        "retriable HTTP error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Verdict::GiveUp => {
                    warn!(context, status = %resp.status(), "non-retriable HTTP error");
                    return None;
                }
            },
            Err(e) if e.is_timeout() || e.is_connect() => {
                let delay = Duration::from_secs(2u64.pow(attempt));
                warn!(context, error = %e, ?delay, "network error, backing off");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(context, error = %e, "request failed");
                return None;
            }
        }
    }
    warn!(context, max_attempts, "retries exhausted");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_attempts_returns_none() {
        let client = Client::new();
        let result = send_with_backoff(&client, |c| c.get("http://127.0.0.1:1/"), 0, "test").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_connection_refused_exhausts_attempts() {
        // Port 1 refuses connections; one attempt, one backoff, then None
        let client = Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();

        let result =
            send_with_backoff(&client, |c| c.get("http://127.0.0.1:1/"), 1, "refused").await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_builder_called_once_per_attempt() {
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();

        let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = send_with_backoff(
            &client,
            |c| {
                calls_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                c.get("http://127.0.0.1:1/")
            },
            2,
            "count",
        )
        .await;

        assert!(result.is_none());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rate_limit_backs_off_longer_than_server_error() {
        let rate = match classify_status(StatusCode::TOO_MANY_REQUESTS, 0) {
            Verdict::Retry(d) => d,
            Verdict::GiveUp => panic!("429 must be retriable"),
        };
        let server = match classify_status(StatusCode::BAD_GATEWAY, 0) {
            Verdict::Retry(d) => d,
            Verdict::GiveUp => panic!("502 must be retriable"),
        };
        assert!(rate > server);
    }

    #[test]
    fn test_client_errors_give_up() {
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, 0),
            Verdict::GiveUp
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, 0),
            Verdict::GiveUp
        ));
    }
}
