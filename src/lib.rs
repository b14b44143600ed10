//! # dispatchr
//!
//! **dispatchr** is the dispatch core of an MVC-style framework: it takes a
//! request descriptor — module, handler ("controller"), action, and
//! parameters — resolves it into a concrete controller invocation through an
//! injected service container, executes it, and manages the control flow
//! around dispatch: re-entrant forwarding, vetoable lifecycle events, and a
//! strict exception-to-response path for unhandled failures.
//!
//! It does **not** parse HTTP, match routes, render views, or manage
//! sessions — those are collaborators of the surrounding framework. This
//! crate is the state machine between "the route is resolved" and "the
//! action has run".
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`dispatcher`]** - The dispatch loop, forwarding state machine, and
//!   exception bridge
//! - **[`handler`]** - Controller traits, action tables, and parameter
//!   binding
//! - **[`events`]** - Lifecycle event names, the events-manager trait, and
//!   the cancel sentinel
//! - **[`di`]** - The consumed service container: shared services and
//!   handler factories
//! - **[`response`]** - The `"response"` service surface the exception
//!   bridge touches
//! - **[`runtime_config`]** - Environment-driven settings and process-wide
//!   dispatch defaults
//!
//! ## Request Flow
//!
//! 1. The host sets handler/action/params on the dispatcher (usually from a
//!    prior routing step)
//! 2. `dispatch()` resolves the handler name to a registered factory
//!    (`posts` + `Controller` suffix → `PostsController`)
//! 3. Lifecycle events fire around resolution and invocation; a listener
//!    returning boolean `false` cancels the step
//! 4. The action runs with bound parameters and returns a tagged outcome:
//!    completed with a value, or a forward to a new target
//! 5. Forwards restart the loop in place, bounded against cycles; unhandled
//!    failures become a 404 on the response service plus a
//!    [`DispatchError`], unless a `beforeException` listener suppresses it
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dispatchr::{ActionOutcome, ActionTable, Args, Controller, Dispatcher, ServiceContainer};
//! use serde_json::json;
//!
//! struct PostsController;
//!
//! impl Controller for PostsController {
//!     fn actions() -> ActionTable<Self> {
//!         ActionTable::new().action("index", vec![], |_posts: &mut Self, _args: Args| {
//!             Ok(ActionOutcome::value(json!({ "posts": [] })))
//!         })
//!     }
//! }
//!
//! let mut container = ServiceContainer::new();
//! container.set_controller("PostsController", |_di| PostsController);
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.set_di(Arc::new(container));
//! dispatcher.set_handler_name("posts");
//! dispatcher.set_action_name("index");
//!
//! let status = dispatcher.dispatch().expect("dispatch");
//! assert!(status.is_completed());
//! assert_eq!(dispatcher.returned_value(), Some(&json!({ "posts": [] })));
//! ```
//!
//! ## Concurrency Model
//!
//! Dispatch is single-threaded, synchronous, and cooperative: `dispatch`
//! takes `&mut self`, one dispatch is in flight per instance, and
//! cancellation only ever happens through event return values. Dispatcher
//! instances are per-request; the container and events manager are the
//! shared, read-mostly collaborators.

pub mod di;
pub mod dispatcher;
pub mod events;
pub mod handler;
pub mod response;
pub mod runtime_config;

pub use di::{HandlerFactory, ServiceContainer, ServiceError};
pub use dispatcher::{DispatchError, DispatchStatus, Dispatcher};
pub use events::{is_cancelled, EventPayload, EventRegistry, EventsManager};
pub use handler::{
    bind_args, camelize, ActionOutcome, ActionParams, ActionTable, Args, BindError, Controller,
    ControllerHandler, ForwardTarget, Handler, ParamSpec, ParamVec, ValueVec, MAX_INLINE_PARAMS,
};
pub use response::ResponseService;
pub use runtime_config::{DispatchDefaults, RuntimeConfig, DEFAULT_MAX_FORWARDS};
