//! Shared fixtures for the integration tests: a recording response service,
//! a small set of controllers, and container/dispatcher builders.

#![allow(dead_code)]

use std::sync::Arc;

use dispatchr::{
    ActionOutcome, ActionParams, ActionTable, Args, Controller, Dispatcher, ForwardTarget,
    ParamSpec, ResponseService, ServiceContainer,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Response service that records every status line set on it.
#[derive(Default)]
pub struct RecordingResponse {
    statuses: Mutex<Vec<(u16, String)>>,
}

impl RecordingResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<(u16, String)> {
        self.statuses.lock().clone()
    }
}

impl ResponseService for RecordingResponse {
    fn set_status_code(&self, code: u16, reason: &str) {
        self.statuses.lock().push((code, reason.to_string()));
    }
}

/// Lists and shows posts; also hosts the failing and forwarding actions the
/// error-path tests drive.
pub struct PostsController;

impl Controller for PostsController {
    fn actions() -> ActionTable<Self> {
        ActionTable::new()
            .action("index", vec![], |_posts: &mut Self, _args: Args| {
                Ok(ActionOutcome::value(json!({ "posts": ["first", "second"] })))
            })
            .action(
                "show",
                vec![ParamSpec::required("id")],
                |_posts: &mut Self, args: Args| {
                    let id = args.get(0).cloned().unwrap_or(Value::Null);
                    Ok(ActionOutcome::value(json!({ "id": id })))
                },
            )
            .action("fail", vec![], |_posts: &mut Self, _args: Args| {
                Err(anyhow::anyhow!("database exploded"))
            })
            .action("older", vec![], |_posts: &mut Self, _args: Args| {
                Ok(ActionOutcome::forward(ForwardTarget::to("archive", "list")))
            })
    }
}

/// Target of the forward chain started by `posts`/`older`.
pub struct ArchiveController;

impl Controller for ArchiveController {
    fn actions() -> ActionTable<Self> {
        ActionTable::new().action("list", vec![], |_archive: &mut Self, _args: Args| {
            Ok(ActionOutcome::value(json!({ "archived": true })))
        })
    }
}

/// Forwards to itself until the `remaining` counter runs out. Used to drive
/// the forward bound.
pub struct RelayController;

impl Controller for RelayController {
    fn actions() -> ActionTable<Self> {
        ActionTable::new().action(
            "hop",
            vec![ParamSpec::required("remaining")],
            |_relay: &mut Self, args: Args| {
                let remaining = args.get(0).and_then(Value::as_u64).unwrap_or(0);
                if remaining == 0 {
                    Ok(ActionOutcome::value(json!("landed")))
                } else {
                    Ok(ActionOutcome::forward(
                        ForwardTarget::to("relay", "hop").with_params(ActionParams::positional(
                            [json!(remaining - 1)],
                        )),
                    ))
                }
            },
        )
    }
}

/// Fallback target for the default-handler tests.
pub struct IndexController;

impl Controller for IndexController {
    fn actions() -> ActionTable<Self> {
        ActionTable::new().action("index", vec![], |_index: &mut Self, _args: Args| {
            Ok(ActionOutcome::value(json!("home")))
        })
    }
}

/// Counts initialize calls; `again` forwards to `touch` on the same
/// instance.
pub struct CountingController {
    pub init_count: Arc<Mutex<usize>>,
}

impl Controller for CountingController {
    fn actions() -> ActionTable<Self> {
        ActionTable::new()
            .action("touch", vec![], |_counting: &mut Self, _args: Args| {
                Ok(ActionOutcome::value(json!("touched")))
            })
            .action("again", vec![], |_counting: &mut Self, _args: Args| {
                Ok(ActionOutcome::forward(ForwardTarget::to("counting", "touch")))
            })
    }

    fn initialize(&mut self) {
        *self.init_count.lock() += 1;
    }
}

/// Register the fixture controllers with the container.
pub fn register_all(di: &mut ServiceContainer) {
    di.set_controller("PostsController", |_di| PostsController);
    di.set_controller("ArchiveController", |_di| ArchiveController);
    di.set_controller("RelayController", |_di| RelayController);
    di.set_controller("IndexController", |_di| IndexController);
}

/// A container with the fixture controllers and a recording response
/// service already registered.
pub fn container_with_response() -> (ServiceContainer, Arc<RecordingResponse>) {
    let mut di = ServiceContainer::new();
    register_all(&mut di);
    let response = Arc::new(RecordingResponse::new());
    let shared: Arc<dyn ResponseService> = response.clone();
    di.set_shared("response", shared);
    (di, response)
}

/// A dispatcher wired to the given container.
pub fn dispatcher_with(di: ServiceContainer) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_di(Arc::new(di));
    dispatcher
}
