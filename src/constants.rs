pub mod api {
    pub const DEFAULT_VERSION: u32 = 1;
    pub const USER_AGENT: &str = "api-agent/0.1.0";
    pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
}

pub mod network {
    pub const TIMEOUT_REQUEST_MS: u64 = 30_000;
    pub const ERROR_BODY_PREVIEW_BYTES: usize = 16 * 1024;
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http", "https"];
}
