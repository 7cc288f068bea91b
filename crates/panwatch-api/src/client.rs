// XML API HTTP client
//
// Wraps `reqwest::Client` with the `/api/` endpoint, API-key header
// injection, and `<response>` envelope validation. Endpoint families
// (keygen, op, config, commit) are inherent methods in sibling modules
// to keep this one focused on transport mechanics.

use std::sync::RwLock;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::XmlResponse;
use crate::transport::TransportConfig;

/// Header carrying the API key on every authenticated request.
const API_KEY_HEADER: &str = "X-PAN-KEY";

/// Raw HTTP client for a firewall's XML management API.
///
/// All requests are form-encoded POSTs to `{base}/api/`. Replies are
/// returned only after the `<response status=...>` envelope has been
/// checked, so callers never see an error document as data.
pub struct XmlApiClient {
    http: reqwest::Client,
    base_url: Url,
    /// Generated by [`login`](Self::login), or injected with
    /// [`set_api_key`](Self::set_api_key).
    api_key: RwLock<Option<SecretString>>,
    pub(crate) commit_poll_interval: Duration,
    pub(crate) commit_timeout: Duration,
}

impl XmlApiClient {
    /// Create a client for the management interface at `base_url`
    /// (e.g. `https://192.0.2.1:443`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            api_key: RwLock::new(None),
            commit_poll_interval: transport.commit_poll_interval,
            commit_timeout: transport.commit_timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Commit polling uses the [`TransportConfig`] defaults; adjust with
    /// [`with_commit_polling`](Self::with_commit_polling).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        let defaults = TransportConfig::default();
        Self {
            http,
            base_url,
            api_key: RwLock::new(None),
            commit_poll_interval: defaults.commit_poll_interval,
            commit_timeout: defaults.commit_timeout,
        }
    }

    /// Override the commit job polling cadence and deadline.
    pub fn with_commit_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.commit_poll_interval = interval;
        self.commit_timeout = timeout;
        self
    }

    /// Build the management base URL for `host` and `port`.
    ///
    /// Bare IPv6 literals are bracketed.
    pub fn endpoint_url(host: &str, port: u16) -> Result<Url, Error> {
        let host = host.trim().trim_end_matches('/');
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        Ok(Url::parse(&format!("https://{host}:{port}"))?)
    }

    /// The management base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Use an existing API key instead of generating one.
    pub fn set_api_key(&self, key: SecretString) {
        *self.api_key.write().expect("API key lock poisoned") = Some(key);
    }

    /// Whether an API key is available for authenticated requests.
    pub fn has_api_key(&self) -> bool {
        self.api_key.read().expect("API key lock poisoned").is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/`
    pub(crate) fn api_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join("/api/")?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated request with the given form parameters.
    pub(crate) async fn request(&self, params: &[(&str, &str)]) -> Result<XmlResponse, Error> {
        let key = self
            .api_key
            .read()
            .expect("API key lock poisoned")
            .as_ref()
            .map(|k| k.expose_secret().to_owned())
            .ok_or(Error::NotAuthenticated)?;

        let url = self.api_url()?;
        debug!(kind = param(params, "type"), "POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(API_KEY_HEADER, key)
            .form(params)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Send a request without the API key header (key generation only).
    pub(crate) async fn request_unauthenticated(
        &self,
        params: &[(&str, &str)],
    ) -> Result<XmlResponse, Error> {
        let url = self.api_url()?;
        debug!(kind = param(params, "type"), "POST {}", url);

        let resp = self
            .http
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Map HTTP status and the XML envelope into a result.
    async fn parse_response(resp: reqwest::Response) -> Result<XmlResponse, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "API key rejected (HTTP 401)".into(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(len = body.len(), "response body received");

        if !status.is_success() {
            // PAN-OS usually still sends an error envelope; prefer its message.
            return match XmlResponse::from_envelope(body.clone()) {
                Err(e @ (Error::Api { .. } | Error::Authentication { .. })) => Err(e),
                _ if status == reqwest::StatusCode::FORBIDDEN => Err(Error::Authentication {
                    message: "insufficient permissions (HTTP 403)".into(),
                }),
                _ => Err(Error::Http {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                }),
            };
        }

        XmlResponse::from_envelope(body)
    }
}

fn param<'a>(params: &[(&str, &'a str)], name: &str) -> &'a str {
    params
        .iter()
        .find(|(k, _)| *k == name)
        .map_or("", |(_, v)| *v)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_includes_port() {
        let url = XmlApiClient::endpoint_url("fw.example.net", 4443).unwrap();
        assert_eq!(url.as_str(), "https://fw.example.net:4443/");
    }

    #[test]
    fn endpoint_url_brackets_ipv6() {
        let url = XmlApiClient::endpoint_url("2001:db8::1", 443).unwrap();
        assert_eq!(url.host_str(), Some("[2001:db8::1]"));
    }

    #[test]
    fn client_starts_without_key() {
        let client =
            XmlApiClient::with_client(reqwest::Client::new(), Url::parse("https://fw").unwrap());
        assert!(!client.has_api_key());
        client.set_api_key(SecretString::from("k".to_string()));
        assert!(client.has_api_key());
    }
}
