use std::time::Duration;

use dorisload_runtime::user_agent;
use log::debug;
use reqwest::blocking;
use reqwest::header::{CONTENT_TYPE, EXPECT, LOCATION};
use reqwest::{StatusCode, redirect};

use crate::{
    Destination, LoadOptions, LoadResponse, Transport,
    error::{ClientError, Result},
};

/// Redirect hops followed per stream load. The FE answers with one hop to
/// the BE that takes the load.
const MAX_REDIRECTS: usize = 3;

/// HTTP client for the Doris stream load endpoint.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: blocking::Client,
    base_url: String,
    basic_auth: Option<(String, String)>,
    headers: Vec<(String, String)>,
    debug: bool,
}

/// Configures a [`Client`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    base_url: String,
    basic_auth: Option<(String, String)>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    debug: bool,
}

impl ClientBuilder {
    /// Credentials sent with HTTP basic auth. An empty username and
    /// password disables auth.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let username = username.into();
        let password = password.into();
        self.basic_auth = if username.is_empty() && password.is_empty() {
            None
        } else {
            Some((username, password))
        };
        self
    }

    /// Default header added to every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Log every outgoing request at debug level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn build(self) -> Result<Client> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidUrl { url: self.base_url });
        }

        // Redirects are followed in `stream_load`, which keeps the
        // credentials and the body on every hop.
        let mut http = blocking::Client::builder()
            .user_agent(user_agent())
            .redirect(redirect::Policy::none());
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http.build().map_err(ClientError::Transport)?;

        Ok(Client {
            http,
            base_url,
            basic_auth: self.basic_auth,
            headers: self.headers,
            debug: self.debug,
        })
    }
}

impl Client {
    /// Start configuring a client for the FE at `base_url`,
    /// e.g. `http://fe-host:8030`.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(
        &self,
        url: &str,
        payload: &[u8],
        option_headers: &[(String, String)],
    ) -> blocking::RequestBuilder {
        let mut request = self
            .http
            .put(url)
            .header(EXPECT, "100-continue")
            .header(CONTENT_TYPE, "text/plain; charset=UTF-8")
            .body(payload.to_vec());

        if let Some((username, password)) = &self.basic_auth {
            request = request.basic_auth(username, Some(password));
        }
        for (name, value) in option_headers.iter().chain(self.headers.iter()) {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    /// Send one stream load request and decode its outcome.
    ///
    /// A 307 or 308 from the FE is followed to the BE with the same
    /// credentials, headers and body.
    pub fn stream_load(
        &self,
        payload: &[u8],
        destination: &Destination,
        options: &LoadOptions,
    ) -> Result<LoadResponse> {
        if payload.is_empty() {
            return Err(ClientError::EmptyPayload);
        }

        let mut url = format!("{}{}", self.base_url, destination.stream_load_path());
        let option_headers = options.to_headers();

        let mut hops = 0;
        let response = loop {
            if self.debug {
                debug!(
                    "PUT {url} ({} bytes) headers={:?}",
                    payload.len(),
                    option_headers
                );
            }

            let response = self
                .request(&url, payload, &option_headers)
                .send()
                .map_err(ClientError::Transport)?;

            if !matches!(
                response.status(),
                StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT
            ) {
                break response;
            }

            if hops == MAX_REDIRECTS {
                return Err(ClientError::Redirect {
                    url,
                    reason: format!("more than {MAX_REDIRECTS} redirects"),
                });
            }
            hops += 1;

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| ClientError::Redirect {
                    url: url.clone(),
                    reason: "no Location header".into(),
                })?;
            let next = response
                .url()
                .join(location)
                .map_err(|err| ClientError::Redirect {
                    url: url.clone(),
                    reason: format!("bad Location {location:?}: {err}"),
                })?;

            debug!("stream load redirected from {url} to {next}");
            url = next.to_string();
        };

        let status = response.status();
        let body = response.text().map_err(ClientError::Transport)?;

        if self.debug {
            debug!("{url} -> {status}: {body}");
        }

        if !status.is_success() {
            return Err(ClientError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let decoded: LoadResponse = serde_json::from_str(&body)
            .map_err(|source| ClientError::Decode { source, body })?;

        decoded.into_result()
    }
}

impl Transport for Client {
    fn commit(
        &self,
        payload: &[u8],
        destination: &Destination,
        options: &LoadOptions,
    ) -> Result<LoadResponse> {
        self.stream_load(payload, destination, options)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
