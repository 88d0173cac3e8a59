//! Service layer
//!
//! The routing and recovery core:
//! - HandlerRegistry and keyword routing rules
//! - Dispatcher: hint/keyword resolution and the handler failure boundary
//! - HandlerGenerator: script generation, activation and registration
//! - SelfHealer: diagnose-and-remediate cycle for handler faults
//! - Supporting pieces: diagnosis parser, write guard, feature flags
pub mod diagnosis_parser;
pub mod dispatcher;
pub mod flags;
pub mod handler_generator;
pub mod handler_registry;
pub mod handler_script;
pub mod routing;
pub mod self_healer;
pub mod write_guard;

pub use diagnosis_parser::{parse_model_json, strip_code_fence, DiagnosisParseError};
pub use dispatcher::Dispatcher;
pub use flags::FeatureFlag;
pub use handler_generator::{Activation, CapabilityName, GeneratorError, HandlerGenerator};
pub use handler_registry::HandlerRegistry;
pub use handler_script::{
    check_syntax, sandboxed_engine, validate_handler_source, HandlerValidationError, ScriptHandler,
};
pub use routing::{classify, Category, ROUTING_RULES};
pub use self_healer::{parse_diagnosis, SelfHealer};
pub use write_guard::{WriteGuard, WriteGuardError};
