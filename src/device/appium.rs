use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::ProbeError;
use crate::gesture::gesture_model::ScreenSize;

use super::transport::{DeviceTransport, PointerStep, PointerTrack};

/// Connection settings for the Appium server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppiumConfig {
    pub endpoint: String,
    pub device_name: String,
    pub platform_name: String,
    pub automation_name: String,
    pub language: String,
    pub server_timeout_ms: u64,
}

impl Default for AppiumConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4723".into(),
            device_name: "emulator-5556".into(),
            platform_name: "Android".into(),
            automation_name: "UiAutomator2".into(),
            language: "en".into(),
            server_timeout_ms: 60_000,
        }
    }
}

impl AppiumConfig {
    /// W3C capabilities for a session bound to `app_package`.
    pub fn capabilities(&self, app_package: &str) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "platformName": self.platform_name,
                    "appium:automationName": self.automation_name,
                    "appium:deviceName": self.device_name,
                    "appium:appPackage": app_package,
                    "appium:language": self.language,
                    "appium:autoGrantPermissions": true,
                    "appium:noReset": true,
                    "appium:uiautomator2ServerLaunchTimeout": self.server_timeout_ms,
                    "appium:uiautomator2ServerInstallTimeout": self.server_timeout_ms,
                    "appium:appWaitActivity": "*"
                },
                "firstMatch": [{}]
            }
        })
    }
}

/// W3C error payload carried in `value` on failure.
#[derive(Debug, Deserialize)]
struct WebDriverError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct WindowRect {
    width: f64,
    height: f64,
}

/// A live UiAutomator2 session on an Appium server.
///
/// Every call is a blocking HTTP round-trip. The session is deleted on
/// [`AppiumSession::quit`] or when dropped.
pub struct AppiumSession {
    client: Client,
    base_url: String,
    session_id: String,
    closed: bool,
}

impl AppiumSession {
    /// Create a new session for `app_package`.
    pub fn connect(config: &AppiumConfig, app_package: &str) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.server_timeout_ms.saturating_mul(2)))
            .build()
            .map_err(|e| ProbeError::Http {
                context: "build HTTP client".into(),
                source: e,
            })?;

        let base_url = config.endpoint.trim_end_matches('/').to_string();

        let value = send(
            client
                .post(format!("{}/session", base_url))
                .json(&config.capabilities(app_package)),
            "new session",
        )?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ProbeError::transport("new session", "no sessionId in response"))?
            .to_string();

        info!(endpoint = %base_url, session = %session_id, app = app_package, "appium session created");

        Ok(AppiumSession {
            client,
            base_url,
            session_id,
            closed: false,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}/{}", self.base_url, self.session_id, path)
    }

    fn get(&self, path: &str, command: &str) -> Result<Value, ProbeError> {
        send(self.client.get(self.url(path)), command)
    }

    fn post(&self, path: &str, body: &Value, command: &str) -> Result<Value, ProbeError> {
        send(self.client.post(self.url(path)).json(body), command)
    }

    fn get_string(&self, path: &str, command: &str) -> Result<String, ProbeError> {
        let value = self.get(path, command)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProbeError::transport(command, "expected a string value"))
    }

    /// Delete the session. Best-effort; safe to call twice.
    pub fn quit(&mut self) -> Result<(), ProbeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let url = format!("{}/session/{}", self.base_url, self.session_id);
        match send(self.client.delete(url), "delete session") {
            Ok(_) => {
                info!(session = %self.session_id, "appium session closed");
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "failed to close appium session");
                Err(e)
            }
        }
    }
}

impl DeviceTransport for AppiumSession {
    fn save_screenshot(&mut self, path: &Path) -> Result<(), ProbeError> {
        let encoded = self.get_string("screenshot", "screenshot")?;
        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned)
            .map_err(|e| ProbeError::transport("screenshot", format!("invalid base64: {}", e)))?;

        fs::write(path, bytes).map_err(|e| ProbeError::io(format!("write {}", path.display()), e))
    }

    fn page_source(&mut self) -> Result<String, ProbeError> {
        self.get_string("source", "page source")
    }

    fn current_package(&mut self) -> Result<String, ProbeError> {
        self.get_string("appium/device/current_package", "current package")
    }

    fn activate_app(&mut self, package: &str) -> Result<(), ProbeError> {
        self.post("appium/device/activate_app", &json!({ "appId": package }), "activate app")
            .map(|_| ())
    }

    fn terminate_app(&mut self, package: &str) -> Result<(), ProbeError> {
        self.post("appium/device/terminate_app", &json!({ "appId": package }), "terminate app")
            .map(|_| ())
    }

    fn window_size(&mut self) -> Result<ScreenSize, ProbeError> {
        let value = self.get("window/rect", "window rect")?;
        let rect: WindowRect = serde_json::from_value(value).map_err(|e| ProbeError::JsonParse {
            context: "window rect".into(),
            source: e,
        })?;

        Ok(ScreenSize {
            width: rect.width as i32,
            height: rect.height as i32,
        })
    }

    fn perform(&mut self, tracks: &[PointerTrack]) -> Result<(), ProbeError> {
        let body = json!({ "actions": tracks.iter().map(w3c_track).collect::<Vec<_>>() });
        self.post("actions", &body, "perform actions").map(|_| ())
    }

    fn shell(&mut self, command: &str) -> Result<String, ProbeError> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ProbeError::transport("mobile: shell", "empty command"))?;
        let args: Vec<&str> = parts.collect();

        debug!(command, "device shell");

        let body = json!({
            "script": "mobile: shell",
            "args": [{ "command": program, "args": args }]
        });
        let value = self.post("execute/sync", &body, "mobile: shell")?;

        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

impl Drop for AppiumSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

/// W3C `pointer` input source for one touch track.
pub fn w3c_track(track: &PointerTrack) -> Value {
    let actions: Vec<Value> = track
        .steps
        .iter()
        .map(|step| match step {
            PointerStep::Move { x, y, duration_ms } => json!({
                "type": "pointerMove",
                "duration": duration_ms,
                "origin": "viewport",
                "x": x,
                "y": y
            }),
            PointerStep::Down => json!({ "type": "pointerDown", "button": 0 }),
            PointerStep::Pause { ms } => json!({ "type": "pause", "duration": ms }),
            PointerStep::Up => json!({ "type": "pointerUp", "button": 0 }),
        })
        .collect();

    json!({
        "type": "pointer",
        "id": track.id,
        "parameters": { "pointerType": "touch" },
        "actions": actions
    })
}

/// Send a request and unwrap the W3C `value` envelope.
fn send(request: RequestBuilder, command: &str) -> Result<Value, ProbeError> {
    let response = request.send().map_err(|e| ProbeError::Http {
        context: command.to_string(),
        source: e,
    })?;

    let status = response.status();
    let body: Value = response.json().map_err(|e| ProbeError::Http {
        context: format!("{} response body", command),
        source: e,
    })?;

    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let message = serde_json::from_value::<WebDriverError>(value)
            .map(|e| format!("{} ({}): {}", status, e.error, e.message))
            .unwrap_or_else(|_| status.to_string());
        return Err(ProbeError::transport(command, message));
    }

    Ok(value)
}
