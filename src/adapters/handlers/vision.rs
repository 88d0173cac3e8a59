//! Page inspection over plain HTTP.
//!
//! Reports status, size, title and interactive element counts for a URL.
//! Rendering tasks (screenshots, visual diffs) need a browser and are
//! answered with an error and a hint.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use crate::domain::models::TaskContext;
use crate::domain::ports::Handler;

const DEFAULT_URL: &str = "http://127.0.0.1:7860";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

static INTERACTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(button|input|textarea|select|a)\b[^>]*>"#).expect("valid regex")
});

/// HTTP-only vision handler, reachable through an explicit `vision` hint.
#[derive(Debug, Clone)]
pub struct VisionHandler {
    http: Client,
}

impl VisionHandler {
    pub fn new() -> anyhow::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http })
    }

    async fn inspect(&self, context: &TaskContext) -> Value {
        let url = context
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_URL);

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                return json!({
                    "error": err.to_string(),
                    "hint": format!("Failed to fetch {url}"),
                })
            }
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                return json!({
                    "error": err.to_string(),
                    "hint": format!("Failed to read the response body from {url}"),
                })
            }
        };
        debug!(url = %final_url, status, bytes = body.len(), "page fetched");

        json!({
            "status": "success",
            "url": final_url,
            "http_status": status,
            "size_bytes": body.len(),
            "title": page_title(&body),
            "interactive_elements": interactive_elements(&body),
        })
    }
}

fn page_title(html: &str) -> Option<String> {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|title| !title.is_empty())
}

/// Count of interactive tags by name; anchors only count with an `href`.
fn interactive_elements(html: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for caps in INTERACTIVE.captures_iter(html) {
        let tag = caps[1].to_lowercase();
        if tag == "a" && !caps[0].to_lowercase().contains("href") {
            continue;
        }
        *counts.entry(tag).or_insert(0) += 1;
    }
    counts
}

#[async_trait]
impl Handler for VisionHandler {
    fn name(&self) -> &str {
        "vision"
    }

    async fn execute(&self, task: &str, context: &TaskContext) -> anyhow::Result<Value> {
        let lower = task.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|kw| lower.contains(kw));

        let result = if has(&["screenshot", "capture", "snap", "diff", "compare"]) {
            json!({
                "error": "Rendering tasks need a headless browser, which this handler does not drive.",
                "hint": "Use 'inspect' or 'analyze' to fetch page metadata instead.",
            })
        } else if has(&["analyze", "analyse", "inspect", "review", "element", "vision", "look"]) {
            self.inspect(context).await
        } else {
            json!({
                "error": format!("Vision task not recognised: '{task}'"),
                "hint": "Try: inspect or analyze.",
            })
        };
        Ok(result)
    }
}
