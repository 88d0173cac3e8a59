//! Environment feature switches.
//!
//! Each flag is read on every use, so toggling the variable takes effect
//! without restarting. Only the exact value `"1"` enables a flag.

/// Allows generated handler scripts to be loaded.
pub const ENABLE_GENERATED_HANDLERS: &str = "OMNIROUTE_ENABLE_GENERATED_HANDLERS";

/// Allows `code_change` remediations to write files.
pub const ENABLE_SELF_HEAL_APPLY: &str = "OMNIROUTE_ENABLE_SELF_HEAL_APPLY";

/// Allows the code handler to run snippets through the interpreter.
pub const ENABLE_CODE_EXEC: &str = "OMNIROUTE_ENABLE_CODE_EXEC";

/// Allows the code handler to run `docker build`.
pub const ENABLE_DOCKER_BUILD: &str = "OMNIROUTE_ENABLE_DOCKER_BUILD";

/// Feature switches backed by environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureFlag {
    GeneratedHandlers,
    SelfHealApply,
    CodeExec,
    DockerBuild,
}

impl FeatureFlag {
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::GeneratedHandlers => ENABLE_GENERATED_HANDLERS,
            Self::SelfHealApply => ENABLE_SELF_HEAL_APPLY,
            Self::CodeExec => ENABLE_CODE_EXEC,
            Self::DockerBuild => ENABLE_DOCKER_BUILD,
        }
    }

    pub fn is_enabled(self) -> bool {
        std::env::var(self.env_var()).is_ok_and(|value| value == "1")
    }
}
