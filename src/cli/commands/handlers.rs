//! `omniroute handlers`

use anyhow::Result;
use comfy_table::{presets, Cell, ContentArrangement, Table};
use serde::Serialize;

use crate::application::Orchestrator;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Debug, Serialize)]
pub struct HandlerRow {
    pub key: String,
    pub handler: String,
}

#[derive(Debug, Serialize)]
pub struct HandlersOutput {
    pub handlers: Vec<HandlerRow>,
    pub handlers_dir: String,
}

impl CommandOutput for HandlersOutput {
    fn to_human(&self) -> String {
        if self.handlers.is_empty() {
            return "No handlers registered.".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![Cell::new("KEY"), Cell::new("HANDLER")]);
        for row in &self.handlers {
            table.add_row(vec![Cell::new(&row.key), Cell::new(&row.handler)]);
        }

        format!(
            "{} handler(s), generated scripts in {}:\n{table}",
            self.handlers.len(),
            self.handlers_dir
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config: Config, json_mode: bool) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config).await?;
    let handlers_dir = orchestrator.generator().handlers_dir().display().to_string();
    let registry = orchestrator.registry();

    let mut handlers = Vec::new();
    for key in registry.keys().await {
        if let Some(handler) = registry.get(&key).await {
            handlers.push(HandlerRow {
                handler: handler.name().to_string(),
                key,
            });
        }
    }

    output(
        &HandlersOutput {
            handlers,
            handlers_dir,
        },
        json_mode,
    );
    Ok(())
}
