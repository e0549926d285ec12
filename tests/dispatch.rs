use api_agent::{
    Agent, AgentConfig, AgentError, AgentErrorKind, Cache, HttpRequest, MemoryCache, Transport,
};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every request and answers with a canned payload per format,
/// inferred from the `.json` / `.xml` suffix of the resource path.
struct MockTransport {
    calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    fn last_url(&self) -> String {
        self.calls
            .lock()
            .expect("calls lock")
            .last()
            .expect("at least one call")
            .url
            .clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<Bytes, AgentError> {
        let path = request.url.split('?').next().unwrap_or("");
        let body: &[u8] = if path.ends_with(".xml") {
            b"<ok/>"
        } else {
            br#"{"ok":true}"#
        };
        self.calls.lock().expect("calls lock").push(request.clone());
        Ok(Bytes::from_static(body))
    }
}

struct FailingTransport {
    attempts: AtomicUsize,
}

#[async_trait]
impl Transport for FailingTransport {
    async fn execute(&self, _request: &HttpRequest) -> Result<Bytes, AgentError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AgentError::transport("connection refused"))
    }
}

fn agent_with(transport: Arc<dyn Transport>) -> Agent {
    let config = AgentConfig::new("login", "https://api.example.com", "secret").unwrap();
    Agent::new(config).unwrap().with_transport(transport)
}

#[tokio::test]
async fn every_verb_format_pair_dispatches() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone());

    for verb in ["get", "post", "put", "delete", "patch"] {
        for format in ["Json", "Xml"] {
            let name = format!("{}{}", verb, format);
            let decoded = agent
                .dispatch(&name, serde_json::json!(["hotels"]))
                .await
                .unwrap_or_else(|err| panic!("{} failed: {}", name, err));
            if format == "Json" {
                assert_eq!(
                    decoded.as_json().and_then(|v| v.get("ok")),
                    Some(&Value::Bool(true))
                );
            } else {
                assert_eq!(decoded.as_xml().expect("xml").name, "ok");
            }
        }
    }
    assert_eq!(transport.call_count(), 10);
}

#[tokio::test]
async fn malformed_names_fail_without_a_network_call() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone());

    for name in ["fetchJson", "getYaml", "getjson", "nonsense"] {
        let err = agent
            .dispatch(name, serde_json::json!(["hotels"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AgentErrorKind::UnknownMethod, "name: {}", name);
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn missing_resource_argument_is_unknown_method() {
    let agent = agent_with(MockTransport::new());
    let err = agent
        .dispatch("getJson", serde_json::json!([]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AgentErrorKind::UnknownMethod);
}

#[tokio::test]
async fn authed_calls_carry_login_and_signature_in_the_query() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone());

    agent
        .dispatch("getJson", serde_json::json!(["hotels", {"q": "x"}]))
        .await
        .unwrap();
    let url = transport.last_url();
    assert!(url.starts_with("https://api.example.com/v1/hotels.json?"));
    assert!(url.contains("login=login"), "url: {}", url);
    assert!(url.contains("signature="), "url: {}", url);
}

#[tokio::test]
async fn unauthenticated_calls_are_not_signed() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone());

    agent
        .dispatch("getJson", serde_json::json!(["hotels", {"q": "x"}, false]))
        .await
        .unwrap();
    let url = transport.last_url();
    assert_eq!(url, "https://api.example.com/v1/hotels.json?q=x");
}

#[tokio::test]
async fn cached_call_serves_repeat_calls_from_the_store() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone()).with_cache_store(Arc::new(MemoryCache::new()));
    let args = serde_json::json!(["hotels", {"q": "x"}]);

    let first = agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", args.clone())
        .await
        .unwrap();
    let second = agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", args)
        .await
        .unwrap();

    assert_eq!(transport.call_count(), 1, "second call must be a cache hit");
    assert_eq!(first.as_json(), second.as_json());
}

#[tokio::test]
async fn caching_is_scoped_to_the_armed_call_only() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone()).with_cache_store(Arc::new(MemoryCache::new()));
    let args = serde_json::json!(["hotels", {"q": "x"}]);

    agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", args.clone())
        .await
        .unwrap();
    // Un-armed call with the identical tuple must go to the network.
    agent.dispatch("getJson", args).await.unwrap();

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn different_argument_tuples_use_different_cache_entries() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone()).with_cache_store(Arc::new(MemoryCache::new()));

    agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", serde_json::json!(["hotels", {"q": "x"}]))
        .await
        .unwrap();
    agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", serde_json::json!(["hotels", {"q": "y"}]))
        .await
        .unwrap();

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn expired_entries_fall_through_to_the_network() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone()).with_cache_store(Arc::new(MemoryCache::new()));
    let args = serde_json::json!(["hotels"]);

    agent
        .with_cache(Duration::from_millis(1))
        .dispatch("getJson", args.clone())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", args)
        .await
        .unwrap();

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn arming_without_a_store_stays_live() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone());
    let args = serde_json::json!(["hotels"]);

    agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", args.clone())
        .await
        .unwrap();
    agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", args)
        .await
        .unwrap();

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn zero_ttl_disables_caching() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone()).with_cache_store(Arc::new(MemoryCache::new()));
    let args = serde_json::json!(["hotels"]);

    agent
        .with_cache(Duration::ZERO)
        .dispatch("getJson", args.clone())
        .await
        .unwrap();
    agent
        .with_cache(Duration::ZERO)
        .dispatch("getJson", args)
        .await
        .unwrap();

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn transport_errors_propagate_unchanged() {
    let transport = Arc::new(FailingTransport {
        attempts: AtomicUsize::new(0),
    });
    let agent = agent_with(transport.clone());

    let err = agent
        .dispatch("getJson", serde_json::json!(["hotels"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AgentErrorKind::Transport);
    assert_eq!(err.message, "connection refused");
    assert_eq!(transport.attempts.load(Ordering::SeqCst), 1, "no retries");
}

#[tokio::test]
async fn transport_errors_are_not_cached() {
    struct FlakyTransport {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn execute(&self, _request: &HttpRequest) -> Result<Bytes, AgentError> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AgentError::transport("boom"))
            } else {
                Ok(Bytes::from_static(br#"{"ok":true}"#))
            }
        }
    }

    let transport = Arc::new(FlakyTransport {
        attempts: AtomicUsize::new(0),
    });
    let agent = agent_with(transport.clone()).with_cache_store(Arc::new(MemoryCache::new()));
    let args = serde_json::json!(["hotels"]);

    let err = agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", args.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind, AgentErrorKind::Transport);

    let decoded = agent
        .with_cache(Duration::from_secs(60))
        .dispatch("getJson", args)
        .await
        .unwrap();
    assert_eq!(
        decoded.as_json().and_then(|v| v.get("ok")),
        Some(&Value::Bool(true))
    );
    assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn malformed_payload_surfaces_a_decode_error() {
    struct GarbageTransport;

    #[async_trait]
    impl Transport for GarbageTransport {
        async fn execute(&self, _request: &HttpRequest) -> Result<Bytes, AgentError> {
            Ok(Bytes::from_static(b"{a:"))
        }
    }

    let agent = agent_with(Arc::new(GarbageTransport));
    let err = agent
        .dispatch("getJson", serde_json::json!(["hotels"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AgentErrorKind::Decode);
    let details = err.details.expect("details");
    assert_eq!(details.get("raw"), Some(&Value::from("{a:")));
}

#[tokio::test]
async fn typed_surface_matches_the_dynamic_one() {
    use api_agent::{CallDescriptor, Format, Verb};

    let transport = MockTransport::new();
    let agent = agent_with(transport.clone());

    let descriptor = CallDescriptor::new(Verb::Get, Format::Json, "hotels").with_auth(false);
    agent.call(&descriptor).await.unwrap();
    agent
        .dispatch("getJson", serde_json::json!(["hotels", null, false]))
        .await
        .unwrap();

    let calls = transport.calls.lock().expect("calls lock");
    assert_eq!(calls[0].url, calls[1].url);
}

#[tokio::test]
async fn post_body_reaches_the_wire_form_encoded() {
    let transport = MockTransport::new();
    let agent = agent_with(transport.clone());

    agent
        .dispatch(
            "postJson",
            serde_json::json!(["hotels", {"q": "x"}, {"content": {"foo": "bar"}}, false]),
        )
        .await
        .unwrap();

    let calls = transport.calls.lock().expect("calls lock");
    let request = calls.last().expect("request");
    assert_eq!(request.body.as_deref(), Some(b"foo=bar".as_slice()));
    assert_eq!(
        request.headers.get("Content-type").map(String::as_str),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(
        request.headers.get("Content-length").map(String::as_str),
        Some("7")
    );
}
