use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::info;

use crate::model::{AppRecord, PageNotice};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PLATFORM_LABEL: &str = "微信";

pub struct Notifier {
    http: reqwest::Client,
    webhook_url: String,
}

impl Notifier {
    pub fn new(webhook_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build webhook http client")?;
        Ok(Self { http, webhook_url })
    }

    /// Delivers one detection to the group-chat robot. The response body
    /// is logged for the operator but not interpreted.
    pub async fn send(&self, record: &AppRecord, notice: &PageNotice) -> Result<()> {
        let payload = build_payload(record, notice);
        let response = self
            .http
            .post(&self.webhook_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .context("post alert webhook")?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        info!(status = %status, body = %body, "alert webhook response");
        if !status.is_success() {
            anyhow::bail!("alert webhook responded {}", status);
        }
        Ok(())
    }
}

pub fn build_content(record: &AppRecord, notice: &PageNotice) -> String {
    format!(
        "[DT] {}小程序: {} ({}) | {},{}",
        PLATFORM_LABEL, record.name, record.uuid, notice.title, notice.description
    )
}

pub fn build_payload(record: &AppRecord, notice: &PageNotice) -> Value {
    json!({
        "msgtype": "text",
        "text": { "content": build_content(record, notice) },
        "at": { "isAtAll": true }
    })
}
