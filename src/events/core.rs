//! Events core module - event names, the manager trait, and the registry.

use std::collections::HashMap;

use serde_json::Value;

use crate::dispatcher::{DispatchError, Dispatcher};
use crate::handler::ForwardTarget;

/// Fired once before the loop's first iteration.
pub const BEFORE_DISPATCH_LOOP: &str = "dispatch:beforeDispatchLoop";
/// Fired at the top of every iteration, before handler resolution.
pub const BEFORE_DISPATCH: &str = "dispatch:beforeDispatch";
/// Fired after the handler is resolved, before the action is invoked.
pub const BEFORE_EXECUTE_ROUTE: &str = "dispatch:beforeExecuteRoute";
/// Fired after a successful action invocation.
pub const AFTER_EXECUTE_ROUTE: &str = "dispatch:afterExecuteRoute";
/// Fired at the bottom of every completed iteration.
pub const AFTER_DISPATCH: &str = "dispatch:afterDispatch";
/// Fired exactly once when the loop exits, success or suppressed failure.
pub const AFTER_DISPATCH_LOOP: &str = "dispatch:afterDispatchLoop";
/// Fired by the exception bridge with the constructed error as payload.
pub const BEFORE_EXCEPTION: &str = "dispatch:beforeException";
/// Fired when handler or action resolution fails, before any fallback.
pub const BEFORE_NOT_FOUND_ACTION: &str = "dispatch:beforeNotFoundAction";
/// Fired when a forward is requested, before it is applied.
pub const BEFORE_FORWARD: &str = "dispatch:beforeForward";

/// Extra data attached to a fired event.
#[derive(Debug, Clone, Copy)]
pub enum EventPayload<'a> {
    /// No payload
    None,
    /// The error the exception bridge is about to raise
    Exception(&'a DispatchError),
    /// The target of a requested forward
    Forward(&'a ForwardTarget),
}

/// Whether a fired event's return value is the cancel sentinel.
///
/// Only `Some(Value::Bool(false))` cancels; `None` and every other value
/// proceed.
#[inline]
#[must_use]
pub fn is_cancelled(status: &Option<Value>) -> bool {
    matches!(status, Some(Value::Bool(false)))
}

/// External pub/sub aggregate the dispatcher fires lifecycle events at.
///
/// `fire` returns `None` when no listener handled the event; otherwise the
/// aggregated listener return value, interpreted per [`is_cancelled`].
/// Listeners receive the dispatcher mutably and may alter its target (e.g.
/// call [`Dispatcher::forward`]).
pub trait EventsManager: Send + Sync {
    /// Fire a named event against the listeners.
    fn fire(
        &self,
        event: &str,
        dispatcher: &mut Dispatcher,
        payload: EventPayload<'_>,
    ) -> Option<Value>;
}

type Listener = Box<dyn Fn(&mut Dispatcher, EventPayload<'_>) -> Option<Value> + Send + Sync>;

/// Ordered, name-keyed listener registry.
///
/// Listeners attached to the same event run in attach order. The first
/// listener returning the cancel sentinel short-circuits the rest;
/// otherwise the last non-`None` return value is the fire result.
#[derive(Default)]
pub struct EventRegistry {
    listeners: HashMap<String, Vec<Listener>>,
}

impl EventRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener to a named event.
    pub fn attach<F>(&mut self, event: &str, listener: F)
    where
        F: Fn(&mut Dispatcher, EventPayload<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(Box::new(listener));
    }

    /// Whether any listener is attached to the event.
    #[must_use]
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners.get(event).is_some_and(|l| !l.is_empty())
    }
}

impl EventsManager for EventRegistry {
    fn fire(
        &self,
        event: &str,
        dispatcher: &mut Dispatcher,
        payload: EventPayload<'_>,
    ) -> Option<Value> {
        let listeners = self.listeners.get(event)?;
        let mut last = None;
        for listener in listeners {
            let status = listener(dispatcher, payload);
            if is_cancelled(&status) {
                return status;
            }
            if status.is_some() {
                last = status;
            }
        }
        last
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("events", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}
