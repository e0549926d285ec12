mod agent_error;

pub use agent_error::{AgentError, AgentErrorKind};
