pub mod call;
pub mod decode;
pub mod request;
pub mod signer;
pub mod transport;

use crate::config::AgentConfig;
use crate::errors::AgentError;
use crate::services::cache::{self, Cache};
use crate::services::logger::Logger;
use bytes::Bytes;
use call::{parse_call_name, CallDescriptor};
use decode::Decoded;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use transport::{HttpTransport, Transport};

/// Client for a remote HTTP API exposing resources through verb+format
/// call names. Each call is parsed, bound, signed (when auth is required),
/// executed through the transport, and decoded per the requested format.
///
/// Caching is opt-in per call: `agent.with_cache(ttl).dispatch(...)` serves
/// from and populates the configured cache store for that call only. The
/// agent itself carries no armed-cache state, so concurrent calls cannot
/// observe each other's TTLs.
pub struct Agent {
    config: AgentConfig,
    logger: Logger,
    transport: Arc<dyn Transport>,
    cache: Option<Arc<dyn Cache>>,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        Ok(Self {
            config,
            logger: Logger::new("agent"),
            transport: Arc::new(HttpTransport::new()?),
            cache: None,
        })
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_cache_store(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Arms caching for calls issued through the returned handle. The TTL
    /// applies only to those calls; the agent itself stays cache-free.
    pub fn with_cache(&self, ttl: Duration) -> CachedAgent<'_> {
        CachedAgent { agent: self, ttl }
    }

    /// Dynamic surface: `name` is `<verb><Format>` (e.g. `getJson`) and
    /// `args` the positional argument array
    /// `[resource, params?, bodyOrAuthFlag?, authFlagIfBody?]`.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<Decoded, AgentError> {
        let (verb, format) = parse_call_name(name)?;
        let descriptor = CallDescriptor::bind(verb, format, &args)?;
        self.execute(&descriptor, None).await
    }

    /// Typed surface over an explicit descriptor.
    pub async fn call(&self, descriptor: &CallDescriptor) -> Result<Decoded, AgentError> {
        self.execute(descriptor, None).await
    }

    async fn execute(
        &self,
        descriptor: &CallDescriptor,
        ttl: Option<Duration>,
    ) -> Result<Decoded, AgentError> {
        let raw = self.fetch_raw(descriptor, ttl).await?;
        decode::decode(&raw, descriptor.format)
    }

    async fn fetch_raw(
        &self,
        descriptor: &CallDescriptor,
        ttl: Option<Duration>,
    ) -> Result<Bytes, AgentError> {
        let armed = match (ttl, self.cache.as_ref()) {
            (Some(ttl), Some(cache)) if !ttl.is_zero() => Some((ttl, cache)),
            _ => None,
        };
        let Some((ttl, cache)) = armed else {
            return self.round_trip(descriptor).await;
        };

        let key = cache::build_key(&descriptor.cache_payload());
        if let Some(hit) = cache.get(&key) {
            self.logger.debug(
                "cache hit",
                Some(&serde_json::json!({
                    "resource": descriptor.resource,
                    "key": key,
                })),
            );
            return Ok(hit);
        }

        let raw = self.round_trip(descriptor).await?;
        cache.set(&key, raw.clone(), ttl);
        Ok(raw)
    }

    async fn round_trip(&self, descriptor: &CallDescriptor) -> Result<Bytes, AgentError> {
        let request = request::build(&self.config, descriptor)?;
        if !self.config.profiling() {
            return self.transport.execute(&request).await;
        }

        let span = format!("{}:{}", descriptor.verb.as_str(), request.url);
        let started = Instant::now();
        self.logger
            .debug("request begin", Some(&serde_json::json!({"span": span})));
        let result = self.transport.execute(&request).await;
        self.logger.debug(
            "request end",
            Some(&serde_json::json!({
                "span": span,
                "duration_ms": started.elapsed().as_millis() as u64,
                "ok": result.is_ok(),
            })),
        );
        result
    }
}

/// Borrow-scoped handle arming a cache TTL for the calls issued through it.
pub struct CachedAgent<'a> {
    agent: &'a Agent,
    ttl: Duration,
}

impl CachedAgent<'_> {
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<Decoded, AgentError> {
        let (verb, format) = parse_call_name(name)?;
        let descriptor = CallDescriptor::bind(verb, format, &args)?;
        self.agent.execute(&descriptor, Some(self.ttl)).await
    }

    pub async fn call(&self, descriptor: &CallDescriptor) -> Result<Decoded, AgentError> {
        self.agent.execute(descriptor, Some(self.ttl)).await
    }
}
