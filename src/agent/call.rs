use crate::errors::AgentError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// HTTP verbs the remote API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
            Verb::Patch => "patch",
        }
    }

    /// put/patch/post calls may carry a request body as their 3rd argument.
    pub fn allows_body(self) -> bool {
        matches!(self, Verb::Put | Verb::Patch | Verb::Post)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "get" => Some(Verb::Get),
            "post" => Some(Verb::Post),
            "put" => Some(Verb::Put),
            "delete" => Some(Verb::Delete),
            "patch" => Some(Verb::Patch),
            _ => None,
        }
    }
}

/// Response formats the remote API can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            _ => None,
        }
    }
}

static CALL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^([a-z]+)([A-Z][a-z]+)$").expect("call name pattern is valid"));

/// Parses a virtual call name such as `getJson` or `postXml` into its
/// (verb, format) pair. Any other shape, or an unsupported verb or format,
/// is an `UnknownMethod` error.
pub fn parse_call_name(name: &str) -> Result<(Verb, Format), AgentError> {
    let captures = CALL_NAME
        .captures(name)
        .ok_or_else(|| AgentError::unknown_method(format!("Unknown method `{}`", name)))?;
    let verb = Verb::parse(&captures[1])
        .ok_or_else(|| AgentError::unknown_method(format!("Unknown method `{}`", name)))?;
    let format = Format::parse(&captures[2].to_lowercase())
        .ok_or_else(|| AgentError::unknown_method(format!("Unknown method `{}`", name)))?;
    Ok((verb, format))
}

/// Request body, modeled explicitly instead of inspecting map shape at
/// request-build time. A `Form` body may embed extra outgoing headers and
/// an optional content override; remaining fields are form-encoded
/// wholesale when no override is present.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Raw(String),
    Form {
        fields: Map<String, Value>,
        headers: Map<String, Value>,
        content: Option<Value>,
    },
}

impl Body {
    /// Builds a body from a dynamic argument. Strings stay raw, objects
    /// become `Form` with `headers`/`content` pulled out, other scalars are
    /// carried as their string rendering, and null means no body.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(Body::Raw(text.clone())),
            Value::Object(map) => {
                let mut fields = map.clone();
                let headers = match fields.remove("headers") {
                    Some(Value::Object(headers)) => headers,
                    _ => Map::new(),
                };
                let content = fields.remove("content");
                Some(Body::Form {
                    fields,
                    headers,
                    content,
                })
            }
            other => Some(Body::Raw(other.to_string())),
        }
    }

    /// Reconstructs the dynamic shape, used for canonical cache-key
    /// serialization.
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Body::Raw(text) => Value::String(text.clone()),
            Body::Form {
                fields,
                headers,
                content,
            } => {
                let mut map = fields.clone();
                if !headers.is_empty() {
                    map.insert("headers".to_string(), Value::Object(headers.clone()));
                }
                if let Some(content) = content {
                    map.insert("content".to_string(), content.clone());
                }
                Value::Object(map)
            }
        }
    }
}

/// One fully-bound call: produced per invocation, consumed once.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    pub resource: String,
    pub params: Map<String, Value>,
    pub verb: Verb,
    pub format: Format,
    pub auth: bool,
    pub body: Option<Body>,
}

impl CallDescriptor {
    /// Typed entry point: auth defaults to true, params empty, no body.
    pub fn new(verb: Verb, format: Format, resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Map::new(),
            verb,
            format,
            auth: true,
            body: None,
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Binds a positional argument list for the dynamic surface:
    /// `[resource, params?, bodyOrAuthFlag?, authFlagIfBody?]`. The body
    /// slot only exists for verbs that allow one.
    pub fn bind(verb: Verb, format: Format, args: &Value) -> Result<Self, AgentError> {
        let args = args
            .as_array()
            .ok_or_else(|| AgentError::unknown_method("Call arguments must be an array"))?;
        let resource = args
            .first()
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AgentError::unknown_method("Method is not defined"))?
            .to_string();
        let params = match args.get(1) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(AgentError::unknown_method("params must be an object"));
            }
        };

        let (body, auth) = if verb.allows_body() && matches!(args.get(2), Some(v) if !v.is_null()) {
            let body = args.get(2).and_then(Body::from_value);
            let auth = args.get(3).and_then(Value::as_bool).unwrap_or(true);
            (body, auth)
        } else {
            let auth = args.get(2).and_then(Value::as_bool).unwrap_or(true);
            (None, auth)
        };

        Ok(Self {
            resource,
            params,
            verb,
            format,
            auth,
            body,
        })
    }

    /// Canonical serialization of the full call tuple, the cache-key
    /// material.
    pub(crate) fn cache_payload(&self) -> Value {
        serde_json::json!({
            "resource": self.resource,
            "params": Value::Object(self.params.clone()),
            "verb": self.verb.as_str(),
            "format": self.format.as_str(),
            "auth": self.auth,
            "body": self.body.as_ref().map(Body::to_value),
        })
    }
}
