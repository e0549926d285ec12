use super::call::Verb;
use super::request::HttpRequest;
use crate::constants::network;
use crate::errors::AgentError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::collections::HashMap;
use std::time::Duration;

/// Pluggable "perform HTTP request, return raw bytes or fail" capability.
/// The dispatcher performs exactly one `execute` per live call; nothing is
/// retried here or above.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> Result<Bytes, AgentError>;
}

/// Default transport over a shared reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(network::TIMEOUT_REQUEST_MS))
            .build()
            .map_err(|err| AgentError::transport(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<Bytes, AgentError> {
        let mut req = self
            .client
            .request(method_for(request.verb), &request.url)
            .headers(headers_to_headermap(&request.headers)?);
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let response = req.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let preview = read_preview(response).await;
            return Err(
                AgentError::transport(format!("HTTP request failed ({})", status.as_u16()))
                    .with_details(serde_json::json!({
                        "status": status.as_u16(),
                        "url": request.url,
                        "body": preview,
                    })),
            );
        }

        response.bytes().await.map_err(map_reqwest_error)
    }
}

fn method_for(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Delete => Method::DELETE,
        Verb::Patch => Method::PATCH,
    }
}

fn headers_to_headermap(headers: &HashMap<String, String>) -> Result<HeaderMap, AgentError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| AgentError::transport(format!("Invalid header name `{}`", key)))?;
        let val = HeaderValue::from_str(value)
            .map_err(|_| AgentError::transport(format!("Invalid header value for `{}`", key)))?;
        map.insert(name, val);
    }
    Ok(map)
}

async fn read_preview(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    let limit = network::ERROR_BODY_PREVIEW_BYTES;
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> AgentError {
    if err.is_timeout() {
        return AgentError::timeout("HTTP request timed out");
    }
    AgentError::transport(err.to_string())
}
