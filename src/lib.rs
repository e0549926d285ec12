pub mod agent;
pub mod config;
pub mod constants;
pub mod errors;
pub mod services;

pub use agent::call::{parse_call_name, Body, CallDescriptor, Format, Verb};
pub use agent::decode::{decode, Decoded};
pub use agent::request::HttpRequest;
pub use agent::signer::sign_params;
pub use agent::transport::{HttpTransport, Transport};
pub use agent::{Agent, CachedAgent};
pub use config::AgentConfig;
pub use errors::{AgentError, AgentErrorKind};
pub use services::cache::{Cache, MemoryCache};
