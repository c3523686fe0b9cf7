use reqwest::Client;
use serde_json::{Map, Value};

use crate::{
    config::ApiConfig,
    endpoint::Endpoint,
    error::{Result, WeatherError},
    model::{Params, keys},
};

/// Upstream response body, passed through without schema checks.
pub type ApiResponse = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No parameters have been set yet.
    Unconfigured,
    Configured,
}

/// Request builder and sender for one logical WeatherAPI.com call.
///
/// Holds the API token and the request parameters. Parameters are POSTed as a
/// JSON object; the JSON object that comes back is returned as-is. The same
/// instance can be reused by setting new parameters between sends.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    token: String,
    params: Option<Params>,
    base_url: String,
    endpoint: Endpoint,
    lenient_decode: bool,
    http: Client,
}

impl WeatherApiClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(token, &ApiConfig::default())
    }

    pub fn with_config(token: impl Into<String>, config: &ApiConfig) -> Self {
        Self::with_http_client(token, config, Client::new())
    }

    /// Build on an existing `reqwest::Client` so its connection pool is shared.
    pub fn with_http_client(token: impl Into<String>, config: &ApiConfig, http: Client) -> Self {
        Self {
            token: token.into(),
            params: None,
            base_url: config.base_url.clone(),
            endpoint: config.endpoint,
            lenient_decode: config.lenient_decode,
            http,
        }
    }

    /// Point the client at another upstream, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Return an empty map instead of a [`WeatherError::Decode`] when the body isn't a JSON object.
    pub fn with_lenient_decode(mut self, lenient: bool) -> Self {
        self.lenient_decode = lenient;
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = token.into();
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: Endpoint) {
        self.endpoint = endpoint;
    }

    pub fn url(&self) -> String {
        self.endpoint.url(&self.base_url)
    }

    pub fn set_params(&mut self, params: Params) {
        self.params = Some(params);
    }

    pub fn params(&self) -> Result<&Params> {
        self.params
            .as_ref()
            .ok_or_else(|| WeatherError::invalid_state("parameters have not been set"))
    }

    pub fn state(&self) -> ClientState {
        match self.params {
            Some(_) => ClientState::Configured,
            None => ClientState::Unconfigured,
        }
    }

    /// Body that `send` would POST: the parameters, plus the token as `key`
    /// when the parameters don't carry one.
    pub fn request_body(&self) -> Result<Params> {
        let params = match &self.params {
            Some(p) if !p.is_empty() => p,
            _ => return Err(WeatherError::invalid_state("parameters missing")),
        };

        if params.contains(keys::KEY) {
            return Ok(params.clone());
        }

        if self.token.trim().is_empty() {
            return Err(WeatherError::invalid_state("token missing"));
        }

        Ok(params.clone().with(keys::KEY, self.token.as_str()))
    }

    /// POST the parameters and return the decoded response body.
    ///
    /// HTTP status codes are not checked; whatever body the upstream returns is decoded.
    pub async fn send(&self) -> Result<ApiResponse> {
        let body = self.request_body()?;
        let url = self.url();

        tracing::debug!(%url, params = body.len(), "sending WeatherAPI request");

        let res = self.http.post(&url).json(&body).send().await?;

        let status = res.status();
        let bytes = res.bytes().await?;

        if !status.is_success() {
            tracing::warn!(
                %url,
                %status,
                body = %truncate_body(&String::from_utf8_lossy(&bytes)),
                "WeatherAPI returned a non-success status"
            );
        }

        match serde_json::from_slice::<ApiResponse>(&bytes) {
            Ok(map) => Ok(map),
            Err(err) if self.lenient_decode => {
                tracing::warn!(%url, error = %err, "discarding undecodable WeatherAPI response");
                Ok(ApiResponse::new())
            }
            Err(err) => Err(WeatherError::Decode(err)),
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
