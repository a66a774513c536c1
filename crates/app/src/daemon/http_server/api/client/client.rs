use reqwest::{header::HeaderMap, header::HeaderValue, Client, Response};
use url::Url;

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::v0::download::download_path;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&mut self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client);
        let response = check_status(request_builder.send().await?).await?;
        Ok(response.json::<T::Response>().await?)
    }

    /// Fetch a stored file produced by an encrypt or decrypt call
    pub async fn download(&mut self, name: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.remote.join(&download_path(name))?;
        let response = check_status(self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Turn a non-success response into `ApiError::HttpStatus`, preferring the
/// `error` field of a JSON body over the raw text
async fn check_status(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await?;
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| body.get("error")?.as_str().map(str::to_string))
        .unwrap_or(text);

    Err(ApiError::HttpStatus(status, message))
}
