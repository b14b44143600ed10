//! The `response` collaborator consumed through the service container.
//!
//! The dispatcher never builds HTTP responses itself; when an error is routed
//! through the exception bridge it fetches the service registered under the
//! name `"response"` and sets a pre-emptive status. Hosts register their own
//! implementation (an HTTP response wrapper, a test recorder, ...) as an
//! `Arc<dyn ResponseService>`.

/// Minimal surface of the framework response object the dispatcher touches.
///
/// `set_status_code` takes `&self`: implementations are shared behind `Arc`
/// and are expected to use interior mutability.
pub trait ResponseService: Send + Sync {
    /// Set the HTTP status line, e.g. `set_status_code(404, "Not Found")`.
    fn set_status_code(&self, code: u16, reason: &str);
}
