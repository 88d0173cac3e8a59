//! Omniroute - task-routing agent framework
//!
//! A dispatcher matches free-text tasks to handlers (web, code, voice,
//! vision, or generated scripts), and a self-healer diagnoses and repairs
//! handler failures with the help of a remote code-generation service.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, ports and error types
//! - **Service Layer** (`services`): routing, generation and recovery
//! - **Infrastructure Layer** (`infrastructure`): config, logging, HTTP clients
//! - **Adapters** (`adapters`): built-in handlers
//! - **Application Layer** (`application`): the wired `Orchestrator`
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use omniroute::application::Orchestrator;
//! use omniroute::domain::models::{Config, TaskContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::from_config(Config::default()).await?;
//!     let result = orchestrator
//!         .delegate("book flight from SFO to NYC", TaskContext::new())
//!         .await;
//!     println!("{result}");
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use application::Orchestrator;
pub use domain::errors::GenerationError;
pub use domain::models::{
    Config, Diagnosis, GenerationStatus, RemediationOutcome, TaskContext, TaskRequest,
};
pub use domain::ports::{GenerationClient, Handler, TaskMemory};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Dispatcher, FeatureFlag, HandlerGenerator, HandlerRegistry, SelfHealer};
