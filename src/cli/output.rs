//! Output formatting utilities for the CLI.

use console::{style, StyledObject};
use serde::Serialize;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Styled `status` tag.
///
/// Green: success, fixed. Yellow: proposed, pending_approval, simulated.
/// Red: error, failed, unfixable. Dim: anything else.
pub fn style_status(status: &str) -> StyledObject<&str> {
    match status {
        "success" | "fixed" => style(status).green().bold(),
        "proposed" | "pending_approval" | "simulated" => style(status).yellow(),
        "error" | "failed" | "unfixable" => style(status).red().bold(),
        _ => style(status).dim(),
    }
}

/// Truncate a string to at most `max_len` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
