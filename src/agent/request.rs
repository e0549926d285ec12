use super::call::{Body, CallDescriptor, Verb};
use super::signer;
use crate::config::AgentConfig;
use crate::constants::api;
use crate::errors::AgentError;
use serde_json::Value;
use std::collections::HashMap;

/// One fully-formed wire request. Built fresh per call and never reused;
/// no request state is shared between calls.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub verb: Verb,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// Builds the wire request for a descriptor. Signs the parameters in place
/// when the call requires auth, then assembles
/// `{host}/v{version}/{resource}.{format}?{params}`. Performs no I/O.
pub(crate) fn build(
    config: &AgentConfig,
    descriptor: &CallDescriptor,
) -> Result<HttpRequest, AgentError> {
    let mut params = descriptor.params.clone();
    if descriptor.auth {
        signer::sign_params(&mut params, config.login(), config.token());
    }

    let mut url = format!(
        "{}/v{}/{}.{}",
        config.host().trim_end_matches('/'),
        config.version(),
        descriptor.resource,
        descriptor.format.as_str()
    );
    if !params.is_empty() {
        url.push('?');
        url.push_str(&signer::form_encode(&params));
    }

    let mut headers = HashMap::new();
    headers.insert("User-Agent".to_string(), api::USER_AGENT.to_string());

    let body = descriptor
        .body
        .as_ref()
        .map(|body| render_body(body, &mut headers));

    if let Some(content) = &body {
        // Content-length always reflects the final content, even when the
        // caller supplied one through body headers.
        headers.retain(|key, _| !key.eq_ignore_ascii_case("content-length"));
        headers.insert("Content-length".to_string(), content.len().to_string());
        if !headers.keys().any(|key| key.eq_ignore_ascii_case("content-type")) {
            headers.insert(
                "Content-type".to_string(),
                api::CONTENT_TYPE_FORM.to_string(),
            );
        }
    }

    Ok(HttpRequest {
        url,
        verb: descriptor.verb,
        headers,
        body,
    })
}

fn render_body(body: &Body, headers: &mut HashMap<String, String>) -> Vec<u8> {
    match body {
        Body::Raw(text) => text.clone().into_bytes(),
        Body::Form {
            fields,
            headers: extra,
            content,
        } => {
            for (key, value) in extra {
                headers.insert(key.clone(), render_header_value(value));
            }
            let content = match content {
                Some(Value::Object(map)) => signer::form_encode(map),
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None if !fields.is_empty() => signer::form_encode(fields),
                None => String::new(),
            };
            content.into_bytes()
        }
    }
}

fn render_header_value(value: &Value) -> String {
    value
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| value.to_string())
}
