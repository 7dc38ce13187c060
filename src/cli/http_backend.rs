use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{ListResponse, MutationRequest, MutationResponse};

/// HTTP client backend that sends list and mutation requests to a
/// running `crewdesk serve` instance.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend targeting the given base URL
    /// (e.g. "http://127.0.0.1:8001").
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// `GET /api/<collection>?...`
    pub fn list(&self, collection: &str, query: &[(String, String)]) -> Result<ListResponse> {
        let url = self.url_for(&format!("/api/{collection}"));
        self.send(self.client.get(&url).query(query), &url)
    }

    /// `GET /api/<collection>/<id>`
    pub fn get(&self, collection: &str, id: &str) -> Result<MutationResponse> {
        let url = self.url_for(&format!("/api/{collection}/{id}"));
        self.send(self.client.get(&url), &url)
    }

    /// `POST /api/<collection>` with a `{ method, ... }` body.
    pub fn mutate(&self, collection: &str, request: &MutationRequest) -> Result<MutationResponse> {
        self.post_json(&format!("/api/{collection}"), request)
    }

    fn post_json<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let url = self.url_for(path);
        self.send(self.client.post(&url).json(body), &url)
    }

    fn send<R: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<R> {
        let response = request
            .send()
            .with_context(|| format!("failed to send request to {url}"))?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies carry a `{ success: false, message }` envelope.
            let message = response
                .json::<MutationResponse>()
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(anyhow!("server returned {status} for {url}: {message}"));
        }

        response
            .json::<R>()
            .context("failed to decode JSON response from server")
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
