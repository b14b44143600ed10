//! # Dispatcher Module
//!
//! The dispatch loop: the state machine that turns a
//! `(module, handler, action, params)` descriptor into a controller
//! invocation, and the exception bridge that decides what an unhandled
//! failure becomes.
//!
//! ## Overview
//!
//! The dispatcher is the heart of the framework's request handling. It:
//! - Resolves handler names to registered controller factories through the
//!   injected service container
//! - Fires lifecycle events that can observe or veto each step
//! - Invokes the resolved action with bound parameters
//! - Restarts the loop when an action or listener forwards to a new target
//! - Routes unhandled failures through the exception-to-response bridge
//!
//! ## The loop
//!
//! A fresh dispatch runs `beforeDispatchLoop` once, then iterates: consume
//! the forward flag, substitute defaults for empty names, fire
//! `beforeDispatch`, resolve the handler (running its initialize hook once
//! per instance), fire `beforeExecuteRoute`, bind parameters, invoke, fire
//! `afterExecuteRoute` and `afterDispatch`. A forward — a tagged
//! [`ActionOutcome::Forward`](crate::handler::ActionOutcome) from the
//! action, or a listener calling [`Dispatcher::forward`] — clears the
//! finished flag and the loop goes around again, bounded by the configured
//! forward limit. `afterDispatchLoop` fires once on the way out.
//!
//! ## Error path
//!
//! Failures that the loop cannot recover locally (no fallback target, no
//! listener forward) go through [`Dispatcher::throw_dispatch_exception`]:
//! the `"response"` service gets a pre-emptive 404, `beforeException` fires,
//! and the error either propagates as a [`DispatchError`] or — when a
//! listener returns boolean `false` — is suppressed and the dispatch
//! reports [`DispatchStatus::Cancelled`]. Missing-container errors never
//! reach the events manager; they indicate a miswired host and always
//! propagate.

mod core;
mod error;

pub use self::core::{DispatchStatus, Dispatcher};
pub use self::error::DispatchError;
