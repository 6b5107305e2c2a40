//! Logging utilities with request context support.
//!
//! Each inbound request runs inside a task-local scope holding its request id,
//! so handlers and the upstream client can tag log events without threading
//! the id through every call.

tokio::task_local! {
    /// Task-local storage for the current request ID.
    pub static REQUEST_ID: String;
}

/// Header used to propagate the request id in and out.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Get the current request ID from context, if set.
///
/// Returns an empty string if no request ID is set.
pub fn get_request_id() -> String {
    REQUEST_ID.try_with(|id| id.clone()).unwrap_or_default()
}

/// Generate a new unique request ID using UUID v4.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Default `EnvFilter` directives.
///
/// Noisy HTTP library targets are always appended so that a bare
/// `RUST_LOG=trace` does not flood the output with hyper internals.
pub fn build_filter_directives(rust_log: Option<&str>) -> String {
    let base = rust_log.unwrap_or("info,open_anakin=debug");
    format!("{},hyper=warn,hyper::proto=warn,h2=warn,reqwest=warn", base)
}
