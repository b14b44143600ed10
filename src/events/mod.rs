//! # Events Module
//!
//! Lifecycle events fired around the dispatch loop, and the cancel
//! convention listeners use to veto a step.
//!
//! ## Events
//!
//! Nine `dispatch:*` events fire in a fixed, documented order:
//! `beforeDispatchLoop` once; per iteration `beforeDispatch`,
//! `beforeExecuteRoute`, `afterExecuteRoute`, `afterDispatch`; and
//! `afterDispatchLoop` once at the very end. `beforeNotFoundAction`,
//! `beforeException`, and `beforeForward` fire on their respective paths.
//!
//! ## Cancel sentinel
//!
//! Every fired event returns an `Option<Value>`. Exactly one value cancels
//! the operation that triggered the event: `Some(Value::Bool(false))`.
//! Anything else — `None` (no listener), `Bool(true)`, a number, a string —
//! means proceed. The distinction matters: a listener returning the integer
//! `1` does **not** suppress an exception. [`is_cancelled`] encodes this.
//!
//! ## Implementations
//!
//! The dispatcher consumes the [`EventsManager`] trait and works without one
//! configured. [`EventRegistry`] is a minimal ordered listener aggregate for
//! hosts and tests; frameworks with their own event bus implement the trait
//! over it.

mod core;

pub use self::core::{
    is_cancelled, EventPayload, EventRegistry, EventsManager, AFTER_DISPATCH,
    AFTER_DISPATCH_LOOP, AFTER_EXECUTE_ROUTE, BEFORE_DISPATCH, BEFORE_DISPATCH_LOOP,
    BEFORE_EXCEPTION, BEFORE_EXECUTE_ROUTE, BEFORE_FORWARD, BEFORE_NOT_FOUND_ACTION,
};
