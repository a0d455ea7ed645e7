//! HTTP probe used before committing a link.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, redirect};

/// Verdict of a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    Reachable,
    /// Non-2xx status or transport failure; the text is for diagnostics only.
    Unreachable(String),
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Reachability::Reachable)
    }
}

/// Checks whether a URL answers with a success status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> Reachability;
}

/// Build the HTTP client used for probes.
///
/// Redirects are not followed: reachability is judged on the first response.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("cdnlink/", env!("CDNLINK_VERSION")))
        .redirect(redirect::Policy::none())
        .build()
        .context("Failed to build HTTP client")
}

/// [`Probe`] issuing a single GET, without retries.
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    #[tracing::instrument(skip(self))]
    async fn probe(&self, url: &str) -> Reachability {
        debug!("GET {}...", url);

        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => Reachability::Reachable,
            Ok(response) => {
                let status = response.status();
                debug!("{} answered {}", url, status);
                Reachability::Unreachable(format!("HTTP {}", status.as_u16()))
            }
            Err(e) => {
                debug!("Request to {} failed: {}", url, e);
                Reachability::Unreachable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/npm/lodash@4.17.21/+esm")
            .with_status(200)
            .with_body("export default {};")
            .create_async()
            .await;

        let probe = HttpProbe::new(Client::new());
        let result = probe
            .probe(&format!("{}/npm/lodash@4.17.21/+esm", url))
            .await;

        mock.assert_async().await;
        assert_eq!(result, Reachability::Reachable);
    }

    #[tokio::test]
    async fn test_probe_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/npm/nope/+esm")
            .with_status(404)
            .create_async()
            .await;

        let probe = HttpProbe::new(Client::new());
        let result = probe.probe(&format!("{}/npm/nope/+esm", url)).await;

        mock.assert_async().await;
        assert_eq!(result, Reachability::Unreachable("HTTP 404".to_string()));
    }

    #[tokio::test]
    async fn test_probe_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let probe = HttpProbe::new(Client::new());
        let result = probe.probe(&format!("{}/flaky", url)).await;

        mock.assert_async().await;
        assert!(!result.is_reachable());
    }

    #[tokio::test]
    async fn test_redirect_response_is_unreachable() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let moved = server
            .mock("GET", "/old")
            .with_status(302)
            .with_header("location", &format!("{}/new", url))
            .expect(1)
            .create_async()
            .await;
        let target = server
            .mock("GET", "/new")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let probe = HttpProbe::new(build_client().unwrap());
        let result = probe.probe(&format!("{}/old", url)).await;

        moved.assert_async().await;
        target.assert_async().await;
        assert_eq!(result, Reachability::Unreachable("HTTP 302".to_string()));
    }

    #[tokio::test]
    async fn test_probe_transport_failure() {
        let probe = HttpProbe::new(Client::new());
        // Port 9 (discard) on localhost is not served in the test environment.
        let result = probe.probe("http://127.0.0.1:9/module.js").await;
        assert!(matches!(result, Reachability::Unreachable(_)));
    }

    #[test]
    fn test_build_client() {
        let client = build_client();
        assert!(client.is_ok());
    }
}
