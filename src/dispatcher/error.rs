use std::fmt;

use serde::Serialize;

/// Failure raised out of the dispatch core.
///
/// One exception type for the whole core, distinguished by an integer code
/// (see the associated constants). The code taxonomy is deliberately small:
/// callers interpret it, the dispatcher only guarantees distinct codes for
/// distinct failure classes. `Display` is the bare message — hosts that
/// surface it to users get it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchError {
    message: String,
    code: u32,
}

impl DispatchError {
    /// Default code: unclassified or structural failures.
    pub const UNSPECIFIED: u32 = 0;
    /// The forward bound was exceeded (see `Dispatcher::set_max_forwards`).
    pub const CYCLIC_ROUTING: u32 = 1;
    /// No handler factory is registered for the resolved class name.
    pub const HANDLER_NOT_FOUND: u32 = 2;
    /// Parameter binding failed (missing required parameter).
    pub const INVALID_PARAMS: u32 = 3;
    /// The resolved handler has no such callable method.
    pub const ACTION_NOT_FOUND: u32 = 4;

    /// Construct an error with an explicit code.
    #[must_use]
    pub fn new(message: impl Into<String>, code: u32) -> Self {
        DispatchError {
            message: message.into(),
            code,
        }
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The distinguishing code.
    #[must_use]
    pub fn code(&self) -> u32 {
        self.code
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DispatchError {}
