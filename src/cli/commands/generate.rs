//! `omniroute generate | activate | register`

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::Orchestrator;
use crate::cli::output::{output, style_status, CommandOutput};
use crate::cli::progress::{create_spinner, ProgressBarExt};
use crate::domain::models::{Config, GenerationStatus};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// CamelCase capability name, e.g. Voice or VoiceAgent
    pub name: String,

    /// Free-text requirements passed to the generation service
    #[arg(short, long, default_value = "")]
    pub requirements: String,
}

#[derive(Args, Debug)]
pub struct ActivateArgs {
    /// Capability name used at generation time
    pub name: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// CamelCase capability name, e.g. Voice or VoiceAgent
    pub name: String,

    /// Free-text requirements passed to the generation service
    #[arg(short, long, default_value = "")]
    pub requirements: String,

    /// Registry key (defaults to the lowercased capability name)
    #[arg(short, long)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct GenerationOutput {
    pub status: GenerationStatus,
}

impl CommandOutput for GenerationOutput {
    fn to_human(&self) -> String {
        let label = style_status(self.status.label());
        match &self.status {
            GenerationStatus::Success {
                capability,
                file,
                class,
            } => format!(
                "{label}: {capability} ({class}) written to {}",
                file.display()
            ),
            GenerationStatus::Registered { capability, key } => {
                format!("{label}: {capability} registered as '{key}'")
            }
            GenerationStatus::PendingApproval { message, file, .. } => match file {
                Some(file) => format!("{label}: {message}\nGenerated file: {}", file.display()),
                None => format!("{label}: {message}"),
            },
            GenerationStatus::Error { message } => format!("{label}: {message}"),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.status).unwrap_or_default()
    }
}

fn finish(spinner: &indicatif::ProgressBar, status: &GenerationStatus) {
    if status.is_success() {
        spinner.finish_success("done");
    } else {
        spinner.finish_error(status.label());
    }
}

pub async fn generate(args: GenerateArgs, config: Config, json_mode: bool) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config).await?;

    let spinner = create_spinner(format!("Generating {}", args.name), json_mode);
    let status = orchestrator.generate(&args.name, &args.requirements).await;
    finish(&spinner, &status);

    output(&GenerationOutput { status }, json_mode);
    Ok(())
}

pub async fn activate(args: ActivateArgs, config: Config, json_mode: bool) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config).await?;
    let status = orchestrator.activate(&args.name).await;

    output(&GenerationOutput { status }, json_mode);
    Ok(())
}

pub async fn register(args: RegisterArgs, config: Config, json_mode: bool) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config).await?;

    let spinner = create_spinner(format!("Generating {}", args.name), json_mode);
    let status = orchestrator
        .register(&args.name, &args.requirements, args.key.as_deref())
        .await;
    finish(&spinner, &status);

    output(&GenerationOutput { status }, json_mode);
    Ok(())
}
