//! # Runtime Configuration Module
//!
//! Environment-driven runtime settings and the process-wide dispatch
//! defaults new dispatchers snapshot at construction.
//!
//! ## Environment Variables
//!
//! ### `DISPATCHR_MAX_FORWARDS`
//!
//! Bound on dispatch-loop iterations before the dispatcher fails with a
//! cyclic-routing error. Accepts values in:
//! - Decimal: `256`
//! - Hexadecimal: `0x100`
//!
//! Default: `256`
//!
//! A handler that always forwards would otherwise loop forever; the bound
//! is the only built-in safety valve, so set it above your deepest
//! legitimate forward chain.
//!
//! ## Process-wide defaults
//!
//! Suffix conventions and the fallback target are process-wide and
//! overridable per dispatcher instance:
//!
//! ```rust
//! use dispatchr::runtime_config::{set_process_defaults, DispatchDefaults};
//!
//! set_process_defaults(DispatchDefaults {
//!     handler_suffix: "Handler".to_string(),
//!     ..DispatchDefaults::default()
//! });
//! ```

use std::env;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;

/// Default bound on dispatch-loop iterations.
pub const DEFAULT_MAX_FORWARDS: usize = 256;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Bound on dispatch-loop iterations (default: 256)
    pub max_forwards: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let max_forwards = match env::var("DISPATCHR_MAX_FORWARDS") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_MAX_FORWARDS)
                } else {
                    val.parse().unwrap_or(DEFAULT_MAX_FORWARDS)
                }
            }
            Err(_) => DEFAULT_MAX_FORWARDS,
        };
        RuntimeConfig { max_forwards }
    }
}

/// Process-wide name conventions and fallback target.
///
/// Snapshotted by `Dispatcher::new`; changing them affects dispatchers
/// constructed afterwards, never existing instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchDefaults {
    /// Suffix appended to camelized handler names (default `"Controller"`)
    pub handler_suffix: String,
    /// Suffix appended to action names (default empty)
    pub action_suffix: String,
    /// Fallback handler name (default `"index"`)
    pub default_handler: String,
    /// Fallback action name (default `"index"`)
    pub default_action: String,
}

impl Default for DispatchDefaults {
    fn default() -> Self {
        DispatchDefaults {
            handler_suffix: "Controller".to_string(),
            action_suffix: String::new(),
            default_handler: "index".to_string(),
            default_action: "index".to_string(),
        }
    }
}

static DEFAULTS: Lazy<RwLock<DispatchDefaults>> =
    Lazy::new(|| RwLock::new(DispatchDefaults::default()));

/// Snapshot the process-wide dispatch defaults.
#[must_use]
pub fn process_defaults() -> DispatchDefaults {
    DEFAULTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide dispatch defaults.
pub fn set_process_defaults(defaults: DispatchDefaults) {
    *DEFAULTS.write().unwrap_or_else(PoisonError::into_inner) = defaults;
}
