//! Common test utilities for integration tests
//!
//! Builds an [`Orchestrator`] over a temporary project root with a scripted
//! generation client, so no test touches the network or the working tree.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;

use omniroute::application::Orchestrator;
use omniroute::domain::models::{Config, TaskContext};
use omniroute::domain::ports::NullTaskMemory;
use omniroute::infrastructure::generation::MockGenerationClient;

/// Orchestrator plus the pieces tests inspect.
pub struct TestProject {
    pub dir: TempDir,
    pub client: Arc<MockGenerationClient>,
    pub orchestrator: Orchestrator,
}

impl TestProject {
    pub fn path(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join(relative)
    }
}

/// Orchestrator over a fresh temporary project whose client replies with `replies` in order.
pub async fn project(replies: &[&str]) -> TestProject {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let client = Arc::new(MockGenerationClient::with_replies(replies.iter().copied()));
    let orchestrator = Orchestrator::new(
        Config::for_project(dir.path()),
        client.clone(),
        Arc::new(NullTaskMemory::new()),
    )
    .await
    .expect("Failed to build orchestrator");

    TestProject {
        dir,
        client,
        orchestrator,
    }
}

/// Build a context from a `json!` object literal.
pub fn context(value: serde_json::Value) -> TaskContext {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("context must be a JSON object, got {other}"),
    }
}

/// Handler script defining `{class}(task, context)` that echoes the task.
pub fn echo_script(class: &str) -> String {
    format!(
        "//! Generated {class}.\nfn {class}(task, context) {{\n    #{{ status: \"ok\", handler: \"{class}\", task: task }}\n}}\n"
    )
}
