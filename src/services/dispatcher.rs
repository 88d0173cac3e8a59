//! Task dispatch.
//!
//! Resolves a handler for each task (explicit hint first, then keyword
//! rules), runs it inside a failure boundary, and hands faults to the
//! [`SelfHealer`]. Every delegation is reported to the task memory on a
//! detached task.

use futures::FutureExt;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use super::handler_registry::HandlerRegistry;
use super::routing::classify;
use super::self_healer::SelfHealer;
use crate::domain::models::{TaskRecord, TaskRequest};
use crate::domain::ports::{Handler, TaskMemory};

/// Routes tasks to handlers and owns the failure boundary around them.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    healer: Arc<SelfHealer>,
    memory: Arc<dyn TaskMemory>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        healer: Arc<SelfHealer>,
        memory: Arc<dyn TaskMemory>,
    ) -> Self {
        Self {
            registry,
            healer,
            memory,
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Run one task and return its result payload.
    ///
    /// Never fails: routing errors and recovery outcomes are returned as JSON
    /// values just like handler results.
    #[instrument(skip(self, request), fields(task = %request.task))]
    pub async fn delegate(&self, request: TaskRequest) -> Value {
        let result = match self.resolve(&request).await {
            Ok(handler) => self.execute(handler, &request).await,
            Err(routing_error) => routing_error,
        };

        self.remember(&request, &result);
        result
    }

    /// Insert or replace a handler. Keys are lowercased to match hints.
    pub async fn add_agent(&self, key: &str, handler: Arc<dyn Handler>) -> String {
        let key = key.trim().to_lowercase();
        self.registry.register(key.clone(), handler).await;
        format!("Added {key} agent.")
    }

    async fn resolve(&self, request: &TaskRequest) -> Result<Arc<dyn Handler>, Value> {
        if let Some(hint) = request.agent_hint() {
            return match self.registry.get(&hint).await {
                Some(handler) => {
                    debug!(key = %hint, "handler selected by hint");
                    Ok(handler)
                }
                None => {
                    let available = self.registry.keys().await;
                    warn!(hint = %hint, ?available, "unknown agent hint");
                    Err(json!({
                        "error": format!("Unknown agent '{hint}'"),
                        "orchestrator_warning": format!(
                            "Explicit agent hint '{hint}' does not match a registered agent; \
                             keyword routing was skipped. Available agents: {}",
                            available.join(", ")
                        ),
                    }))
                }
            };
        }

        let routed = match classify(&request.task) {
            Some(category) => self.registry.get(category.handler_key()).await,
            None => None,
        };

        routed
            .inspect(|handler| debug!(handler = handler.name(), "handler selected by keyword"))
            .ok_or_else(|| {
                json!({ "error": format!("No agent available for task: '{}'", request.task) })
            })
    }

    async fn execute(&self, handler: Arc<dyn Handler>, request: &TaskRequest) -> Value {
        let outcome = AssertUnwindSafe(handler.execute(&request.task, &request.context))
            .catch_unwind()
            .await;

        let fault = match outcome {
            Ok(Ok(result)) => return result,
            Ok(Err(err)) => err,
            Err(payload) => anyhow::anyhow!("handler panicked: {}", panic_message(&*payload)),
        };

        error!(handler = handler.name(), error = ?fault, "handler failed");
        self.healer
            .monitor(&request.task, &request.context, &fault)
            .await
            .to_value()
    }

    fn remember(&self, request: &TaskRequest, result: &Value) {
        let memory = Arc::clone(&self.memory);
        let record = TaskRecord::new(request, result);
        tokio::spawn(async move {
            if let Err(err) = memory.record(record).await {
                debug!(error = %err, "task memory record failed");
            }
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
