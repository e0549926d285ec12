use crate::constants::{api, protocols};
use crate::errors::AgentError;
use url::Url;

/// Connection settings for one remote API. Validated once at construction
/// and immutable afterwards; builder methods consume the value so a config
/// cannot change after an [`crate::Agent`] has been built from it.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    login: String,
    host: String,
    token: String,
    version: u32,
    profiling: bool,
}

impl AgentConfig {
    pub fn new(
        login: impl Into<String>,
        host: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, AgentError> {
        let login = ensure_non_empty(login.into(), "login")?;
        let token = ensure_non_empty(token.into(), "token")?;
        let host = ensure_host(ensure_non_empty(host.into(), "host")?)?;
        Ok(Self {
            login,
            host,
            token,
            version: api::DEFAULT_VERSION,
            profiling: false,
        })
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version.max(1);
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn profiling(&self) -> bool {
        self.profiling
    }
}

fn ensure_non_empty(value: String, label: &str) -> Result<String, AgentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AgentError::configuration(format!(
            "{} must be a non-empty string",
            label
        )));
    }
    Ok(trimmed.to_string())
}

fn ensure_host(host: String) -> Result<String, AgentError> {
    let parsed = Url::parse(&host)
        .map_err(|_| AgentError::configuration("host must be an absolute URL"))?;
    if !protocols::ALLOWED_HTTP.contains(&parsed.scheme()) {
        return Err(AgentError::configuration(
            "host must use the http or https scheme",
        ));
    }
    Ok(host)
}
