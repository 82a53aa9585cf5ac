//! Request assembly and response parsing shared by every resource call.
//!
//! Grounded in the teacher's `client-engine::backend::fetch_work`/
//! `submit_job`: build the request against a shared `reqwest::Client`, check
//! `status().is_success()`, and turn a non-2xx response into a typed error
//! carrying the status code for the retry classifier to read.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{ClientError, HttpJobError};

/// Shared HTTP transport: one `reqwest::Client` (itself internally
/// `Arc`-backed, so cloning this is cheap), a base URL every path resolves
/// against, and an optional bearer token.
#[derive(Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: reqwest::Url,
    api_key: Option<String>,
}

impl Transport {
    pub(crate) fn new(http: reqwest::Client, base_url: reqwest::Url, api_key: Option<String>) -> Self {
        Transport { http, base_url, api_key }
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidPath(format!("{path}: {e}")))
    }

    fn request(&self, method: Method, url: reqwest::Url) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// `POST`/`PUT`/`DELETE` a JSON body, discarding any response body
    /// beyond checking its status.
    pub(crate) async fn send<B>(&self, method: Method, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let res = self.request(method, url).json(body).send().await?;
        ensure_success(res).await.map(|_| ())
    }

    /// `DELETE` with no request body.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let url = self.url(path)?;
        let res = self.request(Method::DELETE, url).send().await?;
        ensure_success(res).await.map(|_| ())
    }

    /// `GET` and decode the JSON response body.
    pub(crate) async fn get<R>(&self, path: &str) -> Result<R, ClientError>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path)?;
        let res = self.request(Method::GET, url).send().await?;
        let res = ensure_success(res).await?;
        Ok(res.json().await?)
    }

    /// `POST` a JSON body and decode the JSON response.
    pub(crate) async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path)?;
        let res = self.request(Method::POST, url).json(body).send().await?;
        let res = ensure_success(res).await?;
        Ok(res.json().await?)
    }
}

async fn ensure_success(res: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    tracing::warn!(%status, "backend request failed");
    Err(ClientError::Http(HttpJobError {
        status: Some(status.as_u16()),
        message: if body.is_empty() { status_text(status) } else { body },
    }))
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(|reason| format!("{status} {reason}"))
        .unwrap_or_else(|| status.to_string())
}
