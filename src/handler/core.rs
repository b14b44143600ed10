//! Handler core module - controller erasure, action tables, param binding.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

/// Maximum inline parameters before heap allocation.
/// Most dispatch targets carry well under 8 params.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated named parameter storage.
///
/// Param names use `Arc<str>` instead of `String`: names repeat across
/// forwards and `Arc::clone()` is O(1), while values are per-request data.
pub type ParamVec = SmallVec<[(Arc<str>, Value); MAX_INLINE_PARAMS]>;

/// Stack-allocated positional parameter storage.
pub type ValueVec = SmallVec<[Value; MAX_INLINE_PARAMS]>;

/// Parameters attached to the current dispatch target.
///
/// Either keyed by name or purely positional; the two bind differently
/// (see [`bind_args`]). Duplicate named keys resolve last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ActionParams {
    /// Ordered `(name, value)` pairs
    Named(ParamVec),
    /// Ordered values bound by declared position
    Positional(ValueVec),
}

impl Default for ActionParams {
    fn default() -> Self {
        ActionParams::Positional(ValueVec::new())
    }
}

impl ActionParams {
    /// Build named params from `(name, value)` pairs.
    #[must_use]
    pub fn named<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Arc<str>>,
    {
        ActionParams::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build positional params from a value sequence.
    #[must_use]
    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        ActionParams::Positional(values.into_iter().collect())
    }

    /// Get a named parameter.
    ///
    /// Last write wins: if duplicate names exist, the last occurrence is
    /// returned. Positional params never match by name.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            ActionParams::Named(pairs) => pairs
                .iter()
                .rfind(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v),
            ActionParams::Positional(_) => None,
        }
    }

    /// Get a parameter by position, for either representation.
    #[inline]
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            ActionParams::Named(pairs) => pairs.get(index).map(|(_, v)| v),
            ActionParams::Positional(values) => values.get(index),
        }
    }

    /// Number of parameters carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ActionParams::Named(pairs) => pairs.len(),
            ActionParams::Positional(values) => values.len(),
        }
    }

    /// Whether no parameters are carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A declared parameter on an action: its name and whether it is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParamSpec {
    /// Declared parameter name, matched against named params
    pub name: String,
    /// Required params fail binding when absent; optional ones bind `Null`
    pub required: bool,
}

impl ParamSpec {
    /// Declare a required parameter.
    #[must_use]
    pub fn required(name: &str) -> Self {
        ParamSpec {
            name: name.to_string(),
            required: true,
        }
    }

    /// Declare an optional parameter (binds `Value::Null` when absent).
    #[must_use]
    pub fn optional(name: &str) -> Self {
        ParamSpec {
            name: name.to_string(),
            required: false,
        }
    }
}

/// Parameter-binding failure. Surfaced to the dispatch loop as an
/// invocation error, never silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A required named parameter was not supplied.
    MissingNamed {
        /// The declared parameter name
        name: String,
    },
    /// A required positional parameter was not supplied.
    MissingPositional {
        /// The declared parameter name
        name: String,
        /// The declared position
        index: usize,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::MissingNamed { name } => {
                write!(f, "required parameter '{}' was not supplied", name)
            }
            BindError::MissingPositional { name, index } => {
                write!(
                    f,
                    "required parameter '{}' (position {}) was not supplied",
                    name, index
                )
            }
        }
    }
}

impl std::error::Error for BindError {}

/// Arguments bound for an action call, in declared order.
///
/// Extra positional arguments beyond the declared specs are appended after
/// the declared ones.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: ValueVec,
}

impl Args {
    /// Wrap already-bound values.
    #[must_use]
    pub fn new(values: ValueVec) -> Self {
        Args { values }
    }

    /// Bound value at the declared position.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of bound values (declared + passed-through extras).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values were bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate bound values in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

/// Bind incoming params against an action's declared specs.
///
/// Named params match by declared name, last occurrence winning; unmatched
/// extras are ignored. Positional params bind in declared order; extras are
/// passed through after the declared ones. A missing required parameter
/// fails in both modes.
pub fn bind_args(specs: &[ParamSpec], params: &ActionParams) -> Result<Args, BindError> {
    let mut values = ValueVec::new();
    match params {
        ActionParams::Named(pairs) => {
            for spec in specs {
                match pairs.iter().rfind(|(name, _)| name.as_ref() == spec.name) {
                    Some((_, value)) => values.push(value.clone()),
                    None if spec.required => {
                        return Err(BindError::MissingNamed {
                            name: spec.name.clone(),
                        })
                    }
                    None => values.push(Value::Null),
                }
            }
        }
        ActionParams::Positional(supplied) => {
            for (index, spec) in specs.iter().enumerate() {
                match supplied.get(index) {
                    Some(value) => values.push(value.clone()),
                    None if spec.required => {
                        return Err(BindError::MissingPositional {
                            name: spec.name.clone(),
                            index,
                        })
                    }
                    None => values.push(Value::Null),
                }
            }
            if supplied.len() > specs.len() {
                values.extend(supplied[specs.len()..].iter().cloned());
            }
        }
    }
    Ok(Args::new(values))
}

/// A new dispatch target requested mid-dispatch.
///
/// `None` fields keep the dispatcher's current value; `Some` fields replace
/// it. Serializable so hosts can keep forward tables in config.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ForwardTarget {
    /// Replacement namespace, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Replacement module, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Replacement handler name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    /// Replacement action name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Replacement params, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ActionParams>,
}

impl ForwardTarget {
    /// Forward to another handler and action.
    #[must_use]
    pub fn to(handler: &str, action: &str) -> Self {
        ForwardTarget {
            handler: Some(handler.to_string()),
            action: Some(action.to_string()),
            ..ForwardTarget::default()
        }
    }

    /// Forward to another action on the current handler.
    #[must_use]
    pub fn action(action: &str) -> Self {
        ForwardTarget {
            action: Some(action.to_string()),
            ..ForwardTarget::default()
        }
    }

    /// Replace the namespace as part of the forward.
    #[must_use]
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Replace the module as part of the forward.
    #[must_use]
    pub fn with_module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }

    /// Replace the params as part of the forward.
    #[must_use]
    pub fn with_params(mut self, params: ActionParams) -> Self {
        self.params = Some(params);
        self
    }
}

/// Tagged result of an action invocation, consumed by the dispatch loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action ran to completion, optionally producing a value.
    Completed(Option<Value>),
    /// The action requests a restart of the loop against a new target.
    Forward(ForwardTarget),
}

impl ActionOutcome {
    /// Completion without a value.
    #[must_use]
    pub fn done() -> Self {
        ActionOutcome::Completed(None)
    }

    /// Completion with a returned value.
    #[must_use]
    pub fn value(value: Value) -> Self {
        ActionOutcome::Completed(Some(value))
    }

    /// Request a forward.
    #[must_use]
    pub fn forward(target: ForwardTarget) -> Self {
        ActionOutcome::Forward(target)
    }
}

type ActionCallback<C> = Box<dyn Fn(&mut C, Args) -> anyhow::Result<ActionOutcome> + Send + Sync>;

struct ActionEntry<C> {
    params: Vec<ParamSpec>,
    callback: ActionCallback<C>,
}

/// Capability-checked registry of a controller's callable actions.
///
/// Method names are the fully suffixed form the dispatcher resolves to
/// (with the default empty action suffix, just the action name).
pub struct ActionTable<C> {
    entries: HashMap<String, ActionEntry<C>>,
}

impl<C> ActionTable<C> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        ActionTable {
            entries: HashMap::new(),
        }
    }

    /// Register an action with its declared parameters.
    ///
    /// Replaces any previous entry with the same method name.
    #[must_use]
    pub fn action<F>(mut self, method: &str, params: Vec<ParamSpec>, callback: F) -> Self
    where
        F: Fn(&mut C, Args) -> anyhow::Result<ActionOutcome> + Send + Sync + 'static,
    {
        self.entries.insert(
            method.to_string(),
            ActionEntry {
                params,
                callback: Box::new(callback),
            },
        );
        self
    }

    /// Whether a method is registered.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.entries.contains_key(method)
    }

    /// Declared parameters of a registered method.
    #[must_use]
    pub fn params(&self, method: &str) -> Option<&[ParamSpec]> {
        self.entries.get(method).map(|e| e.params.as_slice())
    }

    /// Registered method names, for diagnostics.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<C> Default for ActionTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ActionTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTable")
            .field("methods", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A controller: a user type with a declared action table and an optional
/// post-construction hook.
pub trait Controller: Send + Sized + 'static {
    /// Declare the controller's callable actions.
    fn actions() -> ActionTable<Self>;

    /// Post-construction hook, run exactly once per instance before the
    /// first action executes on it.
    fn initialize(&mut self) {}
}

/// Object-safe handler interface the dispatch loop drives.
///
/// Implemented by [`ControllerHandler`]; custom implementations are possible
/// for hosts that resolve actions some other way.
pub trait Handler: Send {
    /// Post-construction hook; the loop guarantees a single call per instance.
    fn initialize(&mut self) {}

    /// Declared parameters of the method, or `None` when the handler has no
    /// such callable member. This is the capability check.
    fn action_params(&self, method: &str) -> Option<&[ParamSpec]>;

    /// Invoke the method with bound arguments. Errors propagate to the
    /// dispatch loop uncaught.
    fn invoke(&mut self, method: &str, args: Args) -> anyhow::Result<ActionOutcome>;
}

/// Erases a [`Controller`] behind the [`Handler`] interface.
pub struct ControllerHandler<C: Controller> {
    controller: C,
    table: ActionTable<C>,
}

impl<C: Controller> ControllerHandler<C> {
    /// Wrap a controller instance together with its declared action table.
    #[must_use]
    pub fn new(controller: C) -> Self {
        ControllerHandler {
            controller,
            table: C::actions(),
        }
    }

    /// Borrow the wrapped controller.
    #[must_use]
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Mutably borrow the wrapped controller.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }
}

impl<C: Controller> Handler for ControllerHandler<C> {
    fn initialize(&mut self) {
        self.controller.initialize();
    }

    fn action_params(&self, method: &str) -> Option<&[ParamSpec]> {
        self.table.params(method)
    }

    fn invoke(&mut self, method: &str, args: Args) -> anyhow::Result<ActionOutcome> {
        match self.table.entries.get(method) {
            Some(entry) => (entry.callback)(&mut self.controller, args),
            None => Err(anyhow::anyhow!("action '{}' is not registered", method)),
        }
    }
}

/// Build a concrete class-name stem from a bare handler name.
///
/// Each `/`- or `_`-delimited segment has its first ASCII character
/// uppercased, then segments are concatenated: `blog_posts` → `BlogPosts`,
/// `admin/users` → `AdminUsers`. The suffix convention is applied by the
/// caller, not here.
#[must_use]
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for segment in name.split(['/', '_']) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("posts"), "Posts");
        assert_eq!(camelize("blog_posts"), "BlogPosts");
        assert_eq!(camelize("admin/users"), "AdminUsers");
        assert_eq!(camelize("admin/user_settings"), "AdminUserSettings");
        assert_eq!(camelize(""), "");
    }

    #[test]
    fn test_bind_named_last_write_wins() {
        let specs = [ParamSpec::required("id")];
        let params = ActionParams::named([("id", json!(1)), ("id", json!(2))]);
        let args = bind_args(&specs, &params).expect("bind");
        assert_eq!(args.get(0), Some(&json!(2)));
    }

    #[test]
    fn test_bind_positional_extras_pass_through() {
        let specs = [ParamSpec::required("id")];
        let params = ActionParams::positional([json!(7), json!("extra")]);
        let args = bind_args(&specs, &params).expect("bind");
        assert_eq!(args.len(), 2);
        assert_eq!(args.get(1), Some(&json!("extra")));
    }

    #[test]
    fn test_bind_missing_required_fails() {
        let specs = [ParamSpec::required("id")];
        let err = bind_args(&specs, &ActionParams::default()).expect_err("must fail");
        assert_eq!(
            err,
            BindError::MissingPositional {
                name: "id".to_string(),
                index: 0
            }
        );
    }

    #[test]
    fn test_bind_missing_optional_is_null() {
        let specs = [ParamSpec::required("id"), ParamSpec::optional("page")];
        let params = ActionParams::named([("id", json!(3))]);
        let args = bind_args(&specs, &params).expect("bind");
        assert_eq!(args.get(1), Some(&Value::Null));
    }
}
