use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentErrorKind {
    Configuration,
    UnknownMethod,
    Transport,
    Timeout,
    Decode,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Configuration, "CONFIGURATION", message)
    }

    pub fn unknown_method(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::UnknownMethod, "UNKNOWN_METHOD", message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Transport, "TRANSPORT", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Decode, "DECODE", message)
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for AgentError {}
