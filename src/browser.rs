//! Thin W3C WebDriver client for a remote Chrome (Selenium standalone).
//! Only the handful of commands the scan loop needs are implemented:
//! session open, navigate, page source, session delete.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::BrowserError;

/// Extra wall-clock allowance on top of the page-load timeout so the
/// HTTP layer never gives up before the browser does.
const HTTP_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub headless: bool,
    pub page_load_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            headless: true,
            page_load_timeout: Duration::from_secs(30),
        }
    }
}

pub struct Session {
    http: reqwest::Client,
    base: String,
    session_id: String,
}

impl Session {
    pub async fn open(endpoint: &str, options: &SessionOptions) -> Result<Self, BrowserError> {
        let base = endpoint_base(endpoint);
        let http = reqwest::Client::builder()
            .timeout(options.page_load_timeout + HTTP_GRACE)
            .build()
            .map_err(|err| BrowserError::SessionFailed {
                url: base.clone(),
                reason: err.to_string(),
            })?;

        let params = build_session_params(options);
        let body = dispatch(http.post(format!("{base}/session")).json(&params))
            .await
            .map_err(|err| BrowserError::SessionFailed {
                url: base.clone(),
                reason: err.to_string(),
            })?;
        let session_id = parse_session_id(&body)?.to_string();

        info!(
            endpoint = %base,
            session = %session_id,
            headless = options.headless,
            "webdriver session established"
        );
        Ok(Self {
            http,
            base,
            session_id,
        })
    }

    pub async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        debug!(url = %url, "navigate");
        dispatch(
            self.http
                .post(self.command_url("url"))
                .json(&build_navigate_params(url)),
        )
        .await?;
        Ok(())
    }

    /// Serialized DOM of the current page, after dynamic rendering.
    pub async fn page_source(&self) -> Result<String, BrowserError> {
        let body = dispatch(self.http.get(self.command_url("source"))).await?;
        body.pointer("/value")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol {
                detail: "page source response has no string value".to_string(),
            })
    }

    /// Deletes the remote session, releasing the browser slot on the hub.
    pub async fn quit(self) -> Result<(), BrowserError> {
        let url = format!("{}/session/{}", self.base, self.session_id);
        dispatch(self.http.delete(url)).await?;
        debug!(session = %self.session_id, "webdriver session closed");
        Ok(())
    }

    fn command_url(&self, command: &str) -> String {
        format!("{}/session/{}/{}", self.base, self.session_id, command)
    }
}

async fn dispatch(request: reqwest::RequestBuilder) -> Result<Value, BrowserError> {
    let response = request
        .send()
        .await
        .map_err(|err| BrowserError::Transport {
            reason: err.to_string(),
        })?;
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|err| BrowserError::Protocol {
            detail: format!("unreadable WebDriver response: {err}"),
        })?;
    if !status.is_success() {
        return Err(parse_command_error(&body));
    }
    Ok(body)
}

fn endpoint_base(endpoint: &str) -> String {
    endpoint.trim().trim_end_matches('/').to_string()
}

fn build_session_params(options: &SessionOptions) -> Value {
    let mut args = vec!["--blink-settings=imagesEnabled=false".to_string()];
    if options.headless {
        args.push("--headless".to_string());
    }
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args },
                "timeouts": { "pageLoad": options.page_load_timeout.as_millis() as u64 }
            }
        }
    })
}

fn build_navigate_params(url: &str) -> Value {
    json!({ "url": url })
}

fn parse_session_id(body: &Value) -> Result<&str, BrowserError> {
    body.pointer("/value/sessionId")
        .and_then(Value::as_str)
        .ok_or_else(|| BrowserError::Protocol {
            detail: "new session response has no sessionId".to_string(),
        })
}

fn parse_command_error(body: &Value) -> BrowserError {
    let error = body
        .pointer("/value/error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = body
        .pointer("/value/message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    BrowserError::Command { error, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_params_disable_images_and_set_page_load_timeout() {
        let options = SessionOptions {
            headless: true,
            page_load_timeout: Duration::from_secs(45),
        };
        let params = build_session_params(&options);
        let args = params
            .pointer("/capabilities/alwaysMatch/goog:chromeOptions/args")
            .and_then(Value::as_array)
            .expect("args array");
        assert!(args.contains(&json!("--blink-settings=imagesEnabled=false")));
        assert!(args.contains(&json!("--headless")));
        assert_eq!(
            params.pointer("/capabilities/alwaysMatch/timeouts/pageLoad"),
            Some(&json!(45000))
        );
    }

    #[test]
    fn headful_session_omits_headless_arg() {
        let options = SessionOptions {
            headless: false,
            ..SessionOptions::default()
        };
        let params = build_session_params(&options);
        let args = params
            .pointer("/capabilities/alwaysMatch/goog:chromeOptions/args")
            .and_then(Value::as_array)
            .expect("args array");
        assert!(!args.contains(&json!("--headless")));
    }

    #[test]
    fn navigate_params_carry_the_url() {
        assert_eq!(
            build_navigate_params("https://example.com/a"),
            json!({ "url": "https://example.com/a" })
        );
    }

    #[test]
    fn endpoint_base_strips_trailing_slashes() {
        assert_eq!(
            endpoint_base("http://127.0.0.1:4444/wd/hub/"),
            "http://127.0.0.1:4444/wd/hub"
        );
        assert_eq!(
            endpoint_base(" http://127.0.0.1:4444 "),
            "http://127.0.0.1:4444"
        );
    }

    #[test]
    fn session_id_is_read_from_w3c_response() {
        let body = json!({
            "value": {
                "sessionId": "5f9c2f4a",
                "capabilities": { "browserName": "chrome" }
            }
        });
        assert_eq!(parse_session_id(&body).expect("session id"), "5f9c2f4a");
    }

    #[test]
    fn missing_session_id_is_a_protocol_error() {
        let body = json!({ "value": {} });
        let err = parse_session_id(&body).expect_err("should fail");
        assert!(matches!(err, BrowserError::Protocol { .. }));
    }

    #[test]
    fn command_error_carries_code_and_message() {
        let body = json!({
            "value": {
                "error": "invalid session id",
                "message": "session deleted or not started",
                "stacktrace": ""
            }
        });
        match parse_command_error(&body) {
            BrowserError::Command { error, message } => {
                assert_eq!(error, "invalid session id");
                assert_eq!(message, "session deleted or not started");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_error_body_still_produces_a_command_error() {
        match parse_command_error(&json!({ "value": null })) {
            BrowserError::Command { error, message } => {
                assert_eq!(error, "unknown error");
                assert_eq!(message, "");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
