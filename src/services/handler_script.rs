//! Structural validation of generated handler scripts.
//!
//! A handler script is a Rhai source file whose top level holds only
//! comments and exactly one function definition:
//!
//! ```text
//! //! Optional module documentation.
//! fn VoiceAgent(task, context) {
//!     #{ status: "ok", task: task }
//! }
//! ```
//!
//! Sources are compiled to an AST without being evaluated. The same check runs
//! before a generated script is persisted and again before it is loaded.
//! A loaded script is wrapped in [`ScriptHandler`], which implements the same
//! [`Handler`] port as the built-in handlers.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, Scope, AST};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::models::TaskContext;
use crate::domain::ports::Handler;

/// Number of parameters a handler function takes: `(task, context)`.
pub const HANDLER_ARITY: usize = 2;

/// File extension of persisted handler scripts.
pub const SCRIPT_EXTENSION: &str = "rhai";

const MAX_OPERATIONS: u64 = 1_000_000;
const MAX_CALL_LEVELS: usize = 32;
const MAX_EXPR_DEPTH: usize = 64;
const MAX_STRING_SIZE: usize = 1 << 20;
const MAX_COLLECTION_SIZE: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerValidationError {
    #[error("Generated code has a syntax error: {0}")]
    Syntax(String),

    #[error("Generated code must not contain top-level statements (found {0})")]
    TopLevelStatements(usize),

    #[error("Generated code must define exactly one function named {expected} (found {found})")]
    DefinitionCount { expected: String, found: usize },

    #[error("Generated function is named {found}, expected {expected}")]
    NameMismatch { expected: String, found: String },

    #[error("Function {name} must take exactly {HANDLER_ARITY} parameters (task, context), found {found}")]
    Arity { name: String, found: usize },
}

/// Engine with resource limits suitable for untrusted scripts.
///
/// `eval` and `import` are rejected at compile time and no module resolver is
/// installed, so a script can only run the code that was validated.
pub fn sandboxed_engine() -> Engine {
    let mut engine = Engine::new();
    engine.set_module_resolver(DummyModuleResolver::new());
    engine
        .set_max_operations(MAX_OPERATIONS)
        .set_max_call_levels(MAX_CALL_LEVELS)
        .set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH)
        .set_max_string_size(MAX_STRING_SIZE)
        .set_max_array_size(MAX_COLLECTION_SIZE)
        .set_max_map_size(MAX_COLLECTION_SIZE);
    engine.disable_symbol("eval");
    engine.disable_symbol("import");
    engine
}

/// Compile `source` without running it.
pub fn check_syntax(engine: &Engine, source: &str) -> Result<AST, HandlerValidationError> {
    engine
        .compile(source)
        .map_err(|err| HandlerValidationError::Syntax(err.to_string()))
}

/// Validate that `source` is a well-formed handler script defining `expected_name`.
///
/// Returns the compiled AST on success.
pub fn validate_handler_source(
    engine: &Engine,
    source: &str,
    expected_name: &str,
) -> Result<AST, HandlerValidationError> {
    let ast = check_syntax(engine, source)?;

    let statements = ast.statements().len();
    if statements > 0 {
        return Err(HandlerValidationError::TopLevelStatements(statements));
    }

    let functions: Vec<_> = ast.iter_functions().collect();
    let [function] = functions.as_slice() else {
        return Err(HandlerValidationError::DefinitionCount {
            expected: expected_name.to_string(),
            found: functions.len(),
        });
    };

    if function.name != expected_name {
        return Err(HandlerValidationError::NameMismatch {
            expected: expected_name.to_string(),
            found: function.name.to_string(),
        });
    }

    if function.params.len() != HANDLER_ARITY {
        return Err(HandlerValidationError::Arity {
            name: expected_name.to_string(),
            found: function.params.len(),
        });
    }

    Ok(ast)
}

/// Handler backed by a validated script function.
pub struct ScriptHandler {
    engine: Arc<Engine>,
    ast: Arc<AST>,
    function: String,
}

impl ScriptHandler {
    /// Wrap an AST that has already passed [`validate_handler_source`] for `function`.
    pub fn new(engine: Arc<Engine>, ast: AST, function: impl Into<String>) -> Self {
        Self {
            engine,
            ast: Arc::new(ast),
            function: function.into(),
        }
    }

    /// Validate `source` and wrap it.
    pub fn from_source(
        engine: Arc<Engine>,
        source: &str,
        function: &str,
    ) -> Result<Self, HandlerValidationError> {
        let ast = validate_handler_source(&engine, source, function)?;
        Ok(Self::new(engine, ast, function))
    }
}

#[async_trait]
impl Handler for ScriptHandler {
    fn name(&self) -> &str {
        &self.function
    }

    async fn execute(&self, task: &str, context: &TaskContext) -> anyhow::Result<Value> {
        let engine = Arc::clone(&self.engine);
        let ast = Arc::clone(&self.ast);
        let function = self.function.clone();
        let task = task.to_string();
        let context = rhai::serde::to_dynamic(context)
            .map_err(|err| anyhow!("failed to convert context for {function}: {err}"))?;

        let output = tokio::task::spawn_blocking(move || {
            let mut scope = Scope::new();
            engine
                .call_fn::<Dynamic>(&mut scope, &ast, &function, (task, context))
                .map_err(|err| anyhow!("{function} failed: {err}"))
        })
        .await
        .context("script handler task panicked")??;

        rhai::serde::from_dynamic::<Value>(&output)
            .map_err(|err| anyhow!("{} returned a value that is not JSON-compatible: {err}", self.function))
    }
}
