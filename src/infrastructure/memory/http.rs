use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::models::{MemoryConfig, TaskRecord};
use crate::domain::ports::TaskMemory;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Object body accepted by the store's `/v1/objects` endpoint.
#[derive(Debug, Serialize)]
struct ObjectBody<'a> {
    class: &'a str,
    properties: ObjectProperties,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ObjectProperties {
    content: String,
    context: String,
    result: String,
}

impl From<&TaskRecord> for ObjectProperties {
    fn from(record: &TaskRecord) -> Self {
        Self {
            content: record.task.clone(),
            context: serde_json::Value::Object(record.context.clone()).to_string(),
            result: record.result.to_string(),
        }
    }
}

/// Task memory backed by a vector store's object-creation REST endpoint
pub struct HttpTaskMemory {
    http_client: ReqwestClient,
    endpoint: String,
    class_name: String,
}

impl HttpTaskMemory {
    pub fn new(url: &str, config: &MemoryConfig) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {key}"))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let http_client = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/v1/objects", url.trim_end_matches('/')),
            class_name: config.class_name.clone(),
        })
    }
}

#[async_trait]
impl TaskMemory for HttpTaskMemory {
    async fn record(&self, record: TaskRecord) -> anyhow::Result<()> {
        let body = ObjectBody {
            class: &self.class_name,
            properties: ObjectProperties::from(&record),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("memory store returned {status}");
        }

        debug!(class = %self.class_name, "task recorded");
        Ok(())
    }
}
