// src/checker/http.rs
// =============================================================================
// This module checks whether a single URL is still alive.
//
// Key functionality:
// - Makes one request with the caller's method (GET by default, some servers
//   silently ignore HEAD) and a per-request timeout
// - Follows up to 5 redirects (http -> https, bare -> www chains)
// - Never reads the body; the response is dropped as soon as the status is in
// - Maps what happened to a Verdict, and the Verdict to alive/dead
//
// The mapping is deliberately lopsided. Removing a URL cannot be undone, so
// anything inconclusive counts as alive:
//
//   405 Method Not Allowed  -> alive (server is there, just dislikes the verb)
//   2xx                     -> alive
//   any other status        -> dead
//   timeout                 -> alive
//   any other network error -> dead (DNS, refused, TLS, redirect loop...)
// =============================================================================

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use tracing::debug;

/// Most redirects we follow before calling it a network error.
pub const MAX_REDIRECTS: usize = 5;

/// What a single check ran into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The server answered with this status (anything but 405)
    Status { code: u16 },
    /// The server answered 405
    MethodNotAllowed,
    /// No answer before the deadline
    Timeout,
    /// The request never got a response
    NetworkError { kind: NetworkErrorKind },
}

/// Rough classification of transport failures, for logs and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    Dns,
    Connect,
    Tls,
    TooManyRedirects,
    Other,
}

impl Verdict {
    /// The alive/dead policy. This is the one place it lives.
    pub fn is_valid(&self) -> bool {
        match self {
            Verdict::MethodNotAllowed => true,
            Verdict::Status { code } => StatusCode::from_u16(*code)
                .map(|status| status.is_success())
                .unwrap_or(false),
            Verdict::Timeout => true,
            Verdict::NetworkError { .. } => false,
        }
    }

    /// Short human label, in the same spirit as link-guardian's table.
    pub fn label(&self) -> String {
        match self {
            Verdict::Status { code } if self.is_valid() => format!("✅ HTTP {}", code),
            Verdict::Status { code } => format!("❌ HTTP {}", code),
            Verdict::MethodNotAllowed => "✅ HTTP 405 (method not allowed)".to_string(),
            Verdict::Timeout => "⏱️  TIMEOUT (kept)".to_string(),
            Verdict::NetworkError { kind } => format!("❌ {:?}", kind).to_uppercase(),
        }
    }
}

/// Issues liveness checks with one shared, pooled HTTP client.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    client: Client,
}

impl UrlValidator {
    /// Builds the shared client: limited redirects, gzip + brotli.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Checks one URL and returns true if it should be kept.
    pub async fn validate(&self, method: Method, url: &str, timeout: Duration) -> bool {
        self.check(method, url, timeout).await.is_valid()
    }

    /// Checks one URL and returns the full Verdict.
    pub async fn check(&self, method: Method, url: &str, timeout: Duration) -> Verdict {
        let result = self
            .client
            .request(method.clone(), url)
            .timeout(timeout)
            .send()
            .await;

        let verdict = match result {
            // The response (and its unread body) is dropped right here.
            Ok(response) => verdict_for_status(response.status()),
            Err(e) => verdict_for_error(&e),
        };

        debug!(%method, url, ?verdict, "checked url");
        verdict
    }
}

/// Maps an HTTP status to a Verdict.
pub fn verdict_for_status(status: StatusCode) -> Verdict {
    if status == StatusCode::METHOD_NOT_ALLOWED {
        Verdict::MethodNotAllowed
    } else {
        Verdict::Status {
            code: status.as_u16(),
        }
    }
}

/// Maps a reqwest error to a Verdict.
///
/// Error classification below timeout is only for reporting; every variant
/// other than Timeout ends up dead.
pub fn verdict_for_error(error: &reqwest::Error) -> Verdict {
    if error.is_timeout() {
        return Verdict::Timeout;
    }

    // hyper reports a connect timeout as a connect error; keep those alive too
    if chain_timed_out(error) {
        return Verdict::Timeout;
    }

    // Convert error to string once (including its sources) to sniff details
    let mut error_string = error.to_string().to_lowercase();
    let mut source = error.source();
    while let Some(inner) = source {
        error_string.push_str(&inner.to_string().to_lowercase());
        source = inner.source();
    }

    let kind = if error.is_redirect() {
        NetworkErrorKind::TooManyRedirects
    } else if error_string.contains("dns") || error_string.contains("resolve") {
        NetworkErrorKind::Dns
    } else if error_string.contains("certificate") || error_string.contains("tls") {
        NetworkErrorKind::Tls
    } else if error.is_connect() {
        NetworkErrorKind::Connect
    } else {
        NetworkErrorKind::Other
    };

    Verdict::NetworkError { kind }
}

/// True if any error in the source chain is an `io::Error` of kind TimedOut.
fn chain_timed_out(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io_error) = err.downcast_ref::<io::Error>() {
            if io_error.kind() == io::ErrorKind::TimedOut {
                return true;
            }
        }
        current = err.source();
    }
    false
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not use response.error_for_status()?
//    - It would turn 405 into an error, and 405 has to count as alive.
//
// 2. Why is the timeout set per request instead of on the Client?
//    - Different callers (reconcile vs. the `check` command) pass different
//      deadlines, and one Client is shared for connection pooling.
//
// 3. What happens to the body?
//    - Nothing. We never call .text()/.bytes(), and dropping the Response
//      closes the stream without downloading the rest.
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_server};

    #[test]
    fn test_status_policy() {
        assert!(verdict_for_status(StatusCode::OK).is_valid());
        assert!(verdict_for_status(StatusCode::NO_CONTENT).is_valid());
        assert!(verdict_for_status(StatusCode::METHOD_NOT_ALLOWED).is_valid());
        assert!(!verdict_for_status(StatusCode::NOT_FOUND).is_valid());
        assert!(!verdict_for_status(StatusCode::GONE).is_valid());
        assert!(!verdict_for_status(StatusCode::INTERNAL_SERVER_ERROR).is_valid());
        assert!(!verdict_for_status(StatusCode::FOUND).is_valid());
    }

    #[test]
    fn test_timeout_and_network_policy() {
        assert!(Verdict::Timeout.is_valid());
        assert!(!Verdict::NetworkError {
            kind: NetworkErrorKind::Dns
        }
        .is_valid());
        assert!(!Verdict::NetworkError {
            kind: NetworkErrorKind::Other
        }
        .is_valid());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("connect failed")]
    struct ConnectFailed(#[source] io::Error);

    #[test]
    fn test_timed_out_io_error_anywhere_in_chain() {
        let direct = io::Error::new(io::ErrorKind::TimedOut, "deadline");
        assert!(chain_timed_out(&direct));

        let nested = ConnectFailed(io::Error::new(io::ErrorKind::TimedOut, "deadline"));
        assert!(chain_timed_out(&nested));
    }

    #[test]
    fn test_timed_out_wording_alone_is_not_a_timeout() {
        let refused = ConnectFailed(io::Error::new(io::ErrorKind::Other, "timed out"));
        assert!(!chain_timed_out(&refused));

        let refused = ConnectFailed(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(!chain_timed_out(&refused));
    }

    #[tokio::test]
    async fn test_server_error_is_invalid() {
        let url = format!("{}/status/500", spawn_server().await);
        let validator = UrlValidator::new().unwrap();
        assert!(!validator.validate(Method::GET, &url, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_valid() {
        let url = format!("{}/status/405", spawn_server().await);
        let validator = UrlValidator::new().unwrap();
        let verdict = validator.check(Method::HEAD, &url, Duration::from_secs(5)).await;
        assert_eq!(verdict, Verdict::MethodNotAllowed);
        assert!(verdict.is_valid());
    }

    #[tokio::test]
    async fn test_ok_is_valid() {
        let url = format!("{}/status/200", spawn_server().await);
        let validator = UrlValidator::new().unwrap();
        let verdict = validator.check(Method::GET, &url, Duration::from_secs(5)).await;
        assert_eq!(verdict, Verdict::Status { code: 200 });
    }

    #[tokio::test]
    async fn test_not_found_is_invalid() {
        let url = format!("{}/status/404", spawn_server().await);
        let validator = UrlValidator::new().unwrap();
        assert!(!validator.validate(Method::GET, &url, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_timeout_is_valid() {
        let url = format!("{}/silent", spawn_server().await);
        let validator = UrlValidator::new().unwrap();
        let verdict = validator
            .check(Method::GET, &url, Duration::from_millis(200))
            .await;
        assert_eq!(verdict, Verdict::Timeout);
        assert!(verdict.is_valid());
    }

    #[tokio::test]
    async fn test_timeout_is_valid_for_head_and_post() {
        let url = format!("{}/silent", spawn_server().await);
        let validator = UrlValidator::new().unwrap();

        for method in [Method::HEAD, Method::POST] {
            let verdict = validator
                .check(method.clone(), &url, Duration::from_millis(200))
                .await;
            assert_eq!(verdict, Verdict::Timeout, "{}", method);
            assert!(validator.validate(method, &url, Duration::from_millis(200)).await);
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_invalid() {
        let url = closed_port_url().await;
        let validator = UrlValidator::new().unwrap();
        let verdict = validator.check(Method::GET, &url, Duration::from_secs(5)).await;
        assert!(matches!(verdict, Verdict::NetworkError { .. }));
        assert!(!verdict.is_valid());
    }
}
