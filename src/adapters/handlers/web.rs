//! Simulated web automation.

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::models::TaskContext;
use crate::domain::ports::Handler;

const DEFAULT_URL: &str = "https://example.com";

/// Offline web handler.
///
/// `scrape`/`browse` echo the target URL; `flight`/`book` return a simulated
/// booking tied to this instance's session id.
#[derive(Debug)]
pub struct WebHandler {
    session_id: String,
}

impl WebHandler {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().simple().to_string(),
        }
    }

    fn scrape(context: &TaskContext) -> Value {
        let url = context
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_URL);
        json!({ "status": "simulated", "url": url })
    }

    fn book_flight(&self, context: &TaskContext) -> Value {
        let field = |key: &str, default: &str| {
            context
                .get(key)
                .cloned()
                .unwrap_or_else(|| Value::String(default.to_string()))
        };

        json!({
            "status": "simulated",
            "flight": {
                "from": field("from", "SFO"),
                "to": field("to", "NYC"),
                "date": field("date", ""),
                "booking_id": format!("sim_{}", self.session_id),
            }
        })
    }
}

impl Default for WebHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for WebHandler {
    fn name(&self) -> &str {
        "web"
    }

    async fn execute(&self, task: &str, context: &TaskContext) -> anyhow::Result<Value> {
        let lower = task.to_lowercase();

        let result = if lower.contains("scrape") || lower.contains("browse") {
            Self::scrape(context)
        } else if lower.contains("flight") || lower.contains("book") {
            self.book_flight(context)
        } else {
            json!({ "error": format!("Web task not recognised: '{task}'") })
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scrape_echoes_url() {
        let handler = WebHandler::new();
        let mut context = TaskContext::new();
        context.insert("url".into(), json!("https://rust-lang.org"));

        let result = handler.execute("scrape the page", &context).await.unwrap();

        assert_eq!(result, json!({"status": "simulated", "url": "https://rust-lang.org"}));
    }

    #[tokio::test]
    async fn test_scrape_defaults_url() {
        let result = WebHandler::new()
            .execute("browse", &TaskContext::new())
            .await
            .unwrap();
        assert_eq!(result["url"], DEFAULT_URL);
    }

    #[tokio::test]
    async fn test_book_flight_uses_session_id() {
        let handler = WebHandler::new();
        let mut context = TaskContext::new();
        context.insert("to".into(), json!("LHR"));

        let first = handler.execute("book flight", &context).await.unwrap();
        let second = handler.execute("book flight", &context).await.unwrap();

        assert_eq!(first["flight"]["from"], "SFO");
        assert_eq!(first["flight"]["to"], "LHR");
        assert_eq!(first["flight"]["booking_id"], second["flight"]["booking_id"]);
        assert!(first["flight"]["booking_id"]
            .as_str()
            .unwrap()
            .starts_with("sim_"));
    }

    #[tokio::test]
    async fn test_unrecognised_task_is_error_value() {
        let result = WebHandler::new()
            .execute("web stuff", &TaskContext::new())
            .await
            .unwrap();
        assert!(result["error"].as_str().unwrap().contains("not recognised"));
    }
}
