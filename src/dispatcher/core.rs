//! Dispatcher core module - hot path for request dispatch.
//!
//! This module is part of the request hot path. The following clippy lints
//! are denied to keep allocations out of the loop where avoidable:
//!
//! - `clippy::inefficient_to_string` - Catches unnecessary allocations
//! - `clippy::format_push_string` - Prevents format! string building
//! - `clippy::unnecessary_to_owned` - Prevents .to_owned() on borrowed data

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::di::ServiceContainer;
use crate::events::{self, is_cancelled, EventPayload, EventsManager};
use crate::handler::{bind_args, camelize, ActionOutcome, ActionParams, ForwardTarget, Handler};
use crate::response::ResponseService;
use crate::runtime_config::{self, RuntimeConfig};

use super::error::DispatchError;

/// Raised when dispatch is attempted without a container wired.
const NO_CONTAINER_FOR_DISPATCH: &str =
    "A dependency injection container is required to access related dispatching services";
/// Raised when the exception bridge itself has no container to reach the
/// response service through.
const NO_CONTAINER_FOR_RESPONSE: &str =
    "A dependency injection container is required to access the 'response' service";

/// Terminal state of a dispatch call that did not raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// The loop ran to completion; the action's returned value is recorded
    /// on the dispatcher.
    Completed,
    /// A lifecycle listener cancelled the dispatch, or suppressed a failure
    /// through `dispatch:beforeException`.
    Cancelled,
}

impl DispatchStatus {
    /// Whether the loop ran to completion.
    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, DispatchStatus::Completed)
    }
}

/// A resolved handler instance plus its once-only initialization marker.
struct HandlerSlot {
    handler: Box<dyn Handler>,
    initialized: bool,
}

impl HandlerSlot {
    fn new(handler: Box<dyn Handler>) -> Self {
        HandlerSlot {
            handler,
            initialized: false,
        }
    }
}

/// What a recoverable-failure path decided the loop should do next.
enum StepFlow {
    /// Restart the loop against the (possibly forwarded) target.
    Continue,
    /// Stop the loop with a cancelled status.
    Stop,
}

/// Resolves `(module, handler, action, params)` descriptors into controller
/// invocations and owns the control flow around them.
///
/// One instance serves one request at a time; `dispatch` takes `&mut self`,
/// which is the single-in-flight guarantee. The container and events manager
/// are shared, read-only collaborators injected by the host.
pub struct Dispatcher {
    di: Option<Arc<ServiceContainer>>,
    events: Option<Arc<dyn EventsManager>>,

    namespace_name: String,
    module_name: String,
    handler_name: String,
    action_name: String,
    params: ActionParams,

    handler_suffix: String,
    action_suffix: String,
    default_handler: String,
    default_action: String,
    max_forwards: usize,

    finished: bool,
    forwarded: bool,
    controller_initialized: bool,
    default_fallback_used: bool,

    returned_value: Option<Value>,
    active_handler: Option<String>,
    last_handler: Option<String>,
    instances: HashMap<String, HandlerSlot>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher with the process-wide defaults and the
    /// environment-configured forward bound.
    #[must_use]
    pub fn new() -> Self {
        let defaults = runtime_config::process_defaults();
        let config = RuntimeConfig::from_env();
        Dispatcher {
            di: None,
            events: None,
            namespace_name: String::new(),
            module_name: String::new(),
            handler_name: String::new(),
            action_name: String::new(),
            params: ActionParams::default(),
            handler_suffix: defaults.handler_suffix,
            action_suffix: defaults.action_suffix,
            default_handler: defaults.default_handler,
            default_action: defaults.default_action,
            max_forwards: config.max_forwards,
            finished: true,
            forwarded: false,
            controller_initialized: false,
            default_fallback_used: false,
            returned_value: None,
            active_handler: None,
            last_handler: None,
            instances: HashMap::new(),
        }
    }

    // -- collaborators -----------------------------------------------------

    /// Inject the service container.
    pub fn set_di(&mut self, di: Arc<ServiceContainer>) {
        self.di = Some(di);
    }

    /// The injected service container, if any.
    #[must_use]
    pub fn di(&self) -> Option<&Arc<ServiceContainer>> {
        self.di.as_ref()
    }

    /// Inject the events manager.
    pub fn set_events_manager(&mut self, events: Arc<dyn EventsManager>) {
        self.events = Some(events);
    }

    /// The injected events manager, if any.
    #[must_use]
    pub fn events_manager(&self) -> Option<&Arc<dyn EventsManager>> {
        self.events.as_ref()
    }

    // -- target ------------------------------------------------------------

    /// Set the namespace prepended to resolved class names.
    pub fn set_namespace_name(&mut self, namespace: &str) {
        self.namespace_name = namespace.to_string();
    }

    /// The current namespace.
    #[must_use]
    pub fn namespace_name(&self) -> &str {
        &self.namespace_name
    }

    /// Set the module recorded on the target.
    ///
    /// Informational for host routers; resolution does not consume it.
    pub fn set_module_name(&mut self, module: &str) {
        self.module_name = module.to_string();
    }

    /// The current module.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Set the handler name to be dispatched.
    pub fn set_handler_name(&mut self, handler: &str) {
        self.handler_name = handler.to_string();
    }

    /// The current handler name.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// Set the action name to be invoked.
    pub fn set_action_name(&mut self, action: &str) {
        self.action_name = action.to_string();
    }

    /// The current action name.
    #[must_use]
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Set the action parameters.
    pub fn set_params(&mut self, params: ActionParams) {
        self.params = params;
    }

    /// The current action parameters.
    #[must_use]
    pub fn params(&self) -> &ActionParams {
        &self.params
    }

    /// A named parameter of the current target (last occurrence wins).
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// A parameter of the current target by position.
    #[must_use]
    pub fn param_at(&self, index: usize) -> Option<&Value> {
        self.params.at(index)
    }

    // -- configuration -----------------------------------------------------

    /// Set the suffix appended to resolved handler class names.
    pub fn set_handler_suffix(&mut self, suffix: &str) {
        self.handler_suffix = suffix.to_string();
    }

    /// The handler suffix.
    #[must_use]
    pub fn handler_suffix(&self) -> &str {
        &self.handler_suffix
    }

    /// Set the suffix appended to resolved action method names.
    pub fn set_action_suffix(&mut self, suffix: &str) {
        self.action_suffix = suffix.to_string();
    }

    /// The action suffix.
    #[must_use]
    pub fn action_suffix(&self) -> &str {
        &self.action_suffix
    }

    /// Set the fallback handler used when resolution yields nothing.
    pub fn set_default_handler(&mut self, handler: &str) {
        self.default_handler = handler.to_string();
    }

    /// The fallback handler name.
    #[must_use]
    pub fn default_handler(&self) -> &str {
        &self.default_handler
    }

    /// Set the fallback action used when resolution yields nothing.
    pub fn set_default_action(&mut self, action: &str) {
        self.default_action = action.to_string();
    }

    /// The fallback action name.
    #[must_use]
    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    /// Bound on loop iterations before dispatch fails with
    /// [`DispatchError::CYCLIC_ROUTING`].
    pub fn set_max_forwards(&mut self, max_forwards: usize) {
        self.max_forwards = max_forwards;
    }

    /// The configured forward bound.
    #[must_use]
    pub fn max_forwards(&self) -> usize {
        self.max_forwards
    }

    // -- state -------------------------------------------------------------

    /// Whether the loop has no pending iteration.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether a forward is pending consumption by the next iteration.
    #[must_use]
    pub fn was_forwarded(&self) -> bool {
        self.forwarded
    }

    /// Whether the current handler's initialize hook has run.
    #[must_use]
    pub fn is_controller_initialized(&self) -> bool {
        self.controller_initialized
    }

    /// The value returned by the most recent completed action.
    #[must_use]
    pub fn returned_value(&self) -> Option<&Value> {
        self.returned_value.as_ref()
    }

    /// Class name of the handler currently executing, if any.
    #[must_use]
    pub fn active_handler_name(&self) -> Option<&str> {
        self.active_handler.as_deref()
    }

    /// Class name of the most recently dispatched handler, if any.
    #[must_use]
    pub fn last_handler_name(&self) -> Option<&str> {
        self.last_handler.as_deref()
    }

    /// The handler instance currently executing, if any.
    #[must_use]
    pub fn active_handler(&self) -> Option<&dyn Handler> {
        let name = self.active_handler.as_ref()?;
        self.instances.get(name).map(|slot| &*slot.handler)
    }

    /// The most recently dispatched handler instance, if any.
    #[must_use]
    pub fn last_handler(&self) -> Option<&dyn Handler> {
        let name = self.last_handler.as_ref()?;
        self.instances.get(name).map(|slot| &*slot.handler)
    }

    // -- name resolution ---------------------------------------------------

    /// The concrete class name the current target resolves to:
    /// camelized handler name + handler suffix, namespace-qualified when a
    /// namespace is set.
    #[must_use]
    pub fn handler_class_name(&self) -> String {
        let stem = camelize(&self.handler_name);
        if self.namespace_name.is_empty() {
            format!("{}{}", stem, self.handler_suffix)
        } else {
            format!("{}::{}{}", self.namespace_name, stem, self.handler_suffix)
        }
    }

    /// The method name the current action resolves to: action name with the
    /// action suffix appended verbatim.
    #[must_use]
    pub fn action_method_name(&self) -> String {
        format!("{}{}", self.action_name, self.action_suffix)
    }

    // -- forwarding --------------------------------------------------------

    /// Forward the in-flight dispatch to a new target.
    ///
    /// Fires `dispatch:beforeForward`; a cancelling listener drops the
    /// forward and `false` is returned. Otherwise the target's `Some` fields
    /// replace the dispatcher's current values, the loop is flagged to run
    /// another iteration, and `true` is returned.
    pub fn forward(&mut self, target: ForwardTarget) -> bool {
        let fired = self.fire_event(events::BEFORE_FORWARD, EventPayload::Forward(&target));
        if is_cancelled(&fired) {
            debug!("forward cancelled by beforeForward listener");
            return false;
        }
        debug!(
            handler = target.handler.as_deref().unwrap_or(self.handler_name.as_str()),
            action = target.action.as_deref().unwrap_or(self.action_name.as_str()),
            "Forwarding dispatch"
        );
        if let Some(namespace) = target.namespace {
            self.namespace_name = namespace;
        }
        if let Some(module) = target.module {
            self.module_name = module;
        }
        if let Some(handler) = target.handler {
            self.handler_name = handler;
        }
        if let Some(action) = target.action {
            self.action_name = action;
        }
        if let Some(params) = target.params {
            self.params = params;
        }
        self.finished = false;
        self.forwarded = true;
        self.controller_initialized = false;
        true
    }

    // -- dispatch loop -----------------------------------------------------

    /// Run the dispatch loop against the current target.
    ///
    /// Returns [`DispatchStatus::Completed`] when an action ran to term,
    /// [`DispatchStatus::Cancelled`] when a listener vetoed the dispatch or
    /// suppressed a failure, and `Err` when an unrecovered failure
    /// propagates. The action's returned value, the active handler, and the
    /// last handler are readable through accessors afterwards.
    pub fn dispatch(&mut self) -> Result<DispatchStatus, DispatchError> {
        let di = match &self.di {
            Some(di) => Arc::clone(di),
            None => {
                error!("dispatch attempted without a service container");
                return Err(DispatchError::new(
                    NO_CONTAINER_FOR_DISPATCH,
                    DispatchError::UNSPECIFIED,
                ));
            }
        };

        self.finished = true;
        self.forwarded = false;
        self.default_fallback_used = false;
        self.returned_value = None;

        let fired = self.fire_event(events::BEFORE_DISPATCH_LOOP, EventPayload::None);
        if is_cancelled(&fired) {
            debug!("dispatch cancelled by beforeDispatchLoop listener");
            return Ok(DispatchStatus::Cancelled);
        }

        let mut status = DispatchStatus::Cancelled;
        let mut dispatches: usize = 0;
        self.finished = false;

        while !self.finished {
            dispatches += 1;
            if dispatches > self.max_forwards {
                error!(
                    dispatches = dispatches,
                    max_forwards = self.max_forwards,
                    "Forward bound exceeded"
                );
                self.throw_dispatch_exception(
                    format!(
                        "Too many consecutive forwards were detected while dispatching (max {})",
                        self.max_forwards
                    ),
                    DispatchError::CYCLIC_ROUTING,
                )?;
                status = DispatchStatus::Cancelled;
                break;
            }
            self.finished = true;
            self.forwarded = false;

            if self.handler_name.is_empty() {
                self.handler_name = self.default_handler.clone();
            }
            if self.action_name.is_empty() {
                self.action_name = self.default_action.clone();
            }

            let fired = self.fire_event(events::BEFORE_DISPATCH, EventPayload::None);
            if is_cancelled(&fired) {
                debug!("dispatch cancelled by beforeDispatch listener");
                status = DispatchStatus::Cancelled;
                break;
            }
            if !self.finished {
                continue;
            }

            let class = self.handler_class_name();
            debug!(
                handler = %class,
                cached = self.instances.contains_key(&class),
                "Handler lookup"
            );

            if !self.instances.contains_key(&class) {
                match di.handler_factory(&class) {
                    Some(factory) => {
                        let handler = factory(&di);
                        self.instances.insert(class.clone(), HandlerSlot::new(handler));
                    }
                    None => {
                        error!(handler = %class, "Handler class not found");
                        match self.not_found(
                            format!("{} handler class cannot be loaded", class),
                            DispatchError::HANDLER_NOT_FOUND,
                        )? {
                            StepFlow::Continue => continue,
                            StepFlow::Stop => {
                                status = DispatchStatus::Cancelled;
                                break;
                            }
                        }
                    }
                }
            }

            self.active_handler = Some(class.clone());
            if let Some(slot) = self.instances.get_mut(&class) {
                if !slot.initialized {
                    slot.handler.initialize();
                    slot.initialized = true;
                }
            }
            self.controller_initialized = true;

            let fired = self.fire_event(events::BEFORE_EXECUTE_ROUTE, EventPayload::None);
            if is_cancelled(&fired) {
                debug!("invocation skipped by beforeExecuteRoute listener");
                if !self.finished {
                    continue;
                }
                self.last_handler = self.active_handler.clone();
                status = DispatchStatus::Completed;
                break;
            }
            if !self.finished {
                continue;
            }

            let method = self.action_method_name();
            let bound = self.instances.get(&class).and_then(|slot| {
                slot.handler
                    .action_params(&method)
                    .map(|specs| bind_args(specs, &self.params))
            });
            let args = match bound {
                None => {
                    error!(handler = %class, action = %method, "Action not found on handler");
                    match self.not_found(
                        format!(
                            "Action '{}' was not found on handler '{}'",
                            self.action_name, self.handler_name
                        ),
                        DispatchError::ACTION_NOT_FOUND,
                    )? {
                        StepFlow::Continue => continue,
                        StepFlow::Stop => {
                            status = DispatchStatus::Cancelled;
                            break;
                        }
                    }
                }
                Some(Err(bind_err)) => {
                    warn!(
                        handler = %class,
                        action = %method,
                        error = %bind_err,
                        "Parameter binding failed"
                    );
                    self.throw_dispatch_exception(
                        bind_err.to_string(),
                        DispatchError::INVALID_PARAMS,
                    )?;
                    if !self.finished {
                        continue;
                    }
                    status = DispatchStatus::Cancelled;
                    break;
                }
                Some(Ok(args)) => args,
            };

            debug!(handler = %class, action = %method, "Invoking action");
            let start = Instant::now();
            let invoked = match self.instances.get_mut(&class) {
                Some(slot) => slot.handler.invoke(&method, args),
                None => Err(anyhow::anyhow!(
                    "handler instance '{}' disappeared during dispatch",
                    class
                )),
            };

            match invoked {
                Ok(ActionOutcome::Completed(value)) => {
                    info!(
                        handler = %class,
                        action = %method,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Action invocation complete"
                    );
                    self.returned_value = value;
                    let fired = self.fire_event(events::AFTER_EXECUTE_ROUTE, EventPayload::None);
                    if is_cancelled(&fired) {
                        debug!("dispatch cancelled by afterExecuteRoute listener");
                        status = DispatchStatus::Cancelled;
                        break;
                    }
                    if !self.finished {
                        continue;
                    }
                }
                Ok(ActionOutcome::Forward(target)) => {
                    info!(
                        handler = %class,
                        action = %method,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Action requested a forward"
                    );
                    self.forward(target);
                }
                Err(err) => {
                    error!(
                        handler = %class,
                        action = %method,
                        error = %err,
                        "Action raised an error"
                    );
                    self.throw_dispatch_exception(err.to_string(), DispatchError::UNSPECIFIED)?;
                    if !self.finished {
                        continue;
                    }
                    status = DispatchStatus::Cancelled;
                    break;
                }
            }

            let fired = self.fire_event(events::AFTER_DISPATCH, EventPayload::None);
            if is_cancelled(&fired) {
                debug!("dispatch cancelled by afterDispatch listener");
                status = DispatchStatus::Cancelled;
                break;
            }
            self.last_handler = self.active_handler.clone();
            if self.finished {
                status = DispatchStatus::Completed;
            }
        }

        self.fire_event(events::AFTER_DISPATCH_LOOP, EventPayload::None);
        Ok(status)
    }

    // -- exception bridge --------------------------------------------------

    /// Route an unrecovered failure through the exception path.
    ///
    /// Requires the container: without one this raises immediately with the
    /// documented configuration message, touching nothing else. Otherwise
    /// the `"response"` service gets a pre-emptive `404 Not Found`, the
    /// error is constructed, and `dispatch:beforeException` fires with it as
    /// payload. `Ok(())` is returned only when a listener suppressed the
    /// error with the cancel sentinel; every other outcome is `Err`.
    pub fn throw_dispatch_exception(
        &mut self,
        message: impl Into<String>,
        code: u32,
    ) -> Result<(), DispatchError> {
        let di = match &self.di {
            Some(di) => Arc::clone(di),
            None => {
                return Err(DispatchError::new(
                    NO_CONTAINER_FOR_RESPONSE,
                    DispatchError::UNSPECIFIED,
                ))
            }
        };
        let response = di
            .get_shared::<Arc<dyn ResponseService>>("response")
            .map_err(|err| DispatchError::new(err.to_string(), DispatchError::UNSPECIFIED))?;
        response.set_status_code(404, "Not Found");

        let error = DispatchError::new(message, code);
        let fired = self.fire_event(events::BEFORE_EXCEPTION, EventPayload::Exception(&error));
        if is_cancelled(&fired) {
            debug!(
                code = error.code(),
                "Dispatch error suppressed by beforeException listener"
            );
            return Ok(());
        }
        Err(error)
    }

    // -- internals ---------------------------------------------------------

    /// Shared recovery sequence for handler- and action-not-found: give
    /// listeners a chance to forward or cancel, fall back to the configured
    /// default target once, then bridge the error.
    fn not_found(&mut self, message: String, code: u32) -> Result<StepFlow, DispatchError> {
        let fired = self.fire_event(events::BEFORE_NOT_FOUND_ACTION, EventPayload::None);
        if is_cancelled(&fired) {
            debug!("dispatch cancelled by beforeNotFoundAction listener");
            return Ok(StepFlow::Stop);
        }
        if !self.finished {
            return Ok(StepFlow::Continue);
        }

        if !self.default_fallback_used
            && !self.default_handler.is_empty()
            && (self.handler_name != self.default_handler
                || self.action_name != self.default_action)
        {
            warn!(
                handler = %self.default_handler,
                action = %self.default_action,
                "Falling back to the default target"
            );
            self.default_fallback_used = true;
            self.handler_name = self.default_handler.clone();
            self.action_name = self.default_action.clone();
            self.finished = false;
            self.forwarded = true;
            self.controller_initialized = false;
            return Ok(StepFlow::Continue);
        }

        self.throw_dispatch_exception(message, code)?;
        if !self.finished {
            Ok(StepFlow::Continue)
        } else {
            Ok(StepFlow::Stop)
        }
    }

    /// Fire a lifecycle event at the injected manager, if any.
    fn fire_event(&mut self, event: &str, payload: EventPayload<'_>) -> Option<Value> {
        let events = Arc::clone(self.events.as_ref()?);
        events.fire(event, self, payload)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("namespace_name", &self.namespace_name)
            .field("module_name", &self.module_name)
            .field("handler_name", &self.handler_name)
            .field("action_name", &self.action_name)
            .field("finished", &self.finished)
            .field("forwarded", &self.forwarded)
            .field("active_handler", &self.active_handler)
            .field("last_handler", &self.last_handler)
            .finish()
    }
}
