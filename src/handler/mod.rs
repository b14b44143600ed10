//! # Handler Module
//!
//! Controllers, action tables, and parameter binding — everything the
//! dispatch loop needs to turn a `(handler, action, params)` descriptor into
//! a concrete invocation.
//!
//! ## Overview
//!
//! Resolution is registry-based, not reflective. A user type implements
//! [`Controller`] and declares its callable actions in an [`ActionTable`]:
//! each entry names the method, lists its declared parameters
//! ([`ParamSpec`]), and provides the callback. [`ControllerHandler`] erases
//! the concrete controller behind the object-safe [`Handler`] trait the
//! dispatcher drives.
//!
//! ## Name resolution
//!
//! Bare handler names become concrete class names by capitalizing each
//! `/`- or `_`-delimited segment and appending the configured suffix:
//! `blog_posts` + `Controller` → `BlogPostsController`. Action names get the
//! action suffix appended verbatim (empty by default). See [`camelize`].
//!
//! ## Parameter binding
//!
//! Incoming [`ActionParams`] are either named or positional. Binding walks
//! the action's declared specs in order: named params match by name (last
//! occurrence wins), positional params bind in declared order with extras
//! passed through. A missing required parameter is a hard error — it is
//! never silently defaulted.
//!
//! ## Outcomes
//!
//! Actions return [`ActionOutcome`]: either `Completed` with an optional
//! value, or `Forward` with a [`ForwardTarget`] that makes the dispatch loop
//! restart against a new handler/action/params triple.

mod core;

pub use self::core::{
    bind_args, camelize, ActionOutcome, ActionParams, ActionTable, Args, BindError, Controller,
    ControllerHandler, ForwardTarget, Handler, ParamSpec, ParamVec, ValueVec, MAX_INLINE_PARAMS,
};
