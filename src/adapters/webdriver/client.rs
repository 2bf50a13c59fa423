use crate::domain::locator::{ElementRef, Locator};
use crate::domain::ports::Browser;
use crate::utils::error::{RegoError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;

const NO_SUCH_ELEMENT: &str = "no such element";

/// A W3C WebDriver session spoken over plain HTTP.
#[derive(Debug, Clone)]
pub struct WebDriverSession {
    client: Client,
    session_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// `POST /session` against `endpoint` with the given `alwaysMatch` capabilities.
    pub async fn start(client: &Client, endpoint: &str, capabilities: Value) -> Result<Self> {
        let endpoint = endpoint.trim_end_matches('/');
        let body = json!({ "capabilities": { "alwaysMatch": capabilities } });

        tracing::debug!("Creating WebDriver session at {}", endpoint);
        let response = client
            .post(format!("{}/session", endpoint))
            .json(&body)
            .send()
            .await?;
        let value = unwrap_response(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| RegoError::DriverStartError {
                message: format!("new session response carried no sessionId: {}", value),
            })?
            .to_string();

        tracing::debug!("WebDriver session {} created", session_id);
        Ok(Self {
            client: client.clone(),
            session_url: format!("{}/session/{}", endpoint, session_id),
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = if path.is_empty() {
            self.session_url.clone()
        } else {
            format!("{}/{}", self.session_url, path)
        };

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        unwrap_response(response).await
    }

    async fn find_with(&self, path: &str, locator: &Locator) -> Result<Option<ElementRef>> {
        let (using, value) = locator.strategy();
        match self
            .command(Method::POST, path, Some(json!({ "using": using, "value": value })))
            .await
        {
            Ok(found) => ElementRef::from_json(&found)
                .map(Some)
                .ok_or_else(|| RegoError::page(format!("malformed element reference: {}", found))),
            Err(RegoError::WebDriverError { code, .. }) if code == NO_SUCH_ELEMENT => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_all_with(&self, path: &str, locator: &Locator) -> Result<Vec<ElementRef>> {
        let (using, value) = locator.strategy();
        let found = self
            .command(Method::POST, path, Some(json!({ "using": using, "value": value })))
            .await?;
        Ok(found
            .as_array()
            .map(|items| items.iter().filter_map(ElementRef::from_json).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.command(Method::POST, "url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn set_page_load_timeout(&self, timeout: Duration) -> Result<()> {
        self.command(
            Method::POST,
            "timeouts",
            Some(json!({ "pageLoad": timeout.as_millis() as u64 })),
        )
        .await
        .map(|_| ())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementRef>> {
        self.find_with("element", locator).await
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        self.find_all_with("elements", locator).await
    }

    async fn find_in(&self, parent: &ElementRef, locator: &Locator) -> Result<Option<ElementRef>> {
        self.find_with(&format!("element/{}/element", parent.id()), locator)
            .await
    }

    async fn find_all_in(&self, parent: &ElementRef, locator: &Locator) -> Result<Vec<ElementRef>> {
        self.find_all_with(&format!("element/{}/elements", parent.id()), locator)
            .await
    }

    async fn text(&self, element: &ElementRef) -> Result<String> {
        let value = self
            .command(Method::GET, &format!("element/{}/text", element.id()), None)
            .await?;
        Ok(value_to_string(value).unwrap_or_default())
    }

    async fn property(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = self
            .command(
                Method::GET,
                &format!("element/{}/property/{}", element.id(), name),
                None,
            )
            .await?;
        Ok(value_to_string(value))
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = self
            .command(
                Method::GET,
                &format!("element/{}/attribute/{}", element.id(), name),
                None,
            )
            .await?;
        Ok(value_to_string(value))
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        let value = self
            .command(Method::GET, &format!("element/{}/displayed", element.id()), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        let value = self
            .command(Method::GET, &format!("element/{}/enabled", element.id()), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        self.command(
            Method::POST,
            &format!("element/{}/clear", element.id()),
            Some(json!({})),
        )
        .await
        .map(|_| ())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.command(
            Method::POST,
            &format!("element/{}/value", element.id()),
            Some(json!({ "text": text })),
        )
        .await
        .map(|_| ())
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.command(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn cdp(&self, command: &str, params: Value) -> Result<Value> {
        self.command(
            Method::POST,
            "goog/cdp/execute",
            Some(json!({ "cmd": command, "params": params })),
        )
        .await
    }

    async fn quit(&self) -> Result<()> {
        tracing::debug!("Closing WebDriver session {}", self.session_id);
        self.command(Method::DELETE, "", None).await.map(|_| ())
    }
}

/// Pulls `value` out of a WebDriver response, turning W3C error payloads into errors.
async fn unwrap_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let code = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();

    match code.as_str() {
        "timeout" | "script timeout" => Err(RegoError::Timeout { message }),
        "session not created" => Err(RegoError::DriverStartError { message }),
        _ => Err(RegoError::WebDriverError { code, message }),
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
