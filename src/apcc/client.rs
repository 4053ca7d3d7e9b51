use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::cancel::CancelToken;

#[derive(Debug, Error)]
pub enum ApccError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("APCC returned status {status}: {message}")]
    Server { status: u16, message: String },
    #[error("mount rejected command {command:?}: {message}")]
    CommandFailed { command: String, message: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendCommand {
    reg_value: String,
    command: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SendCommandResponse {
    pub success: bool,
    pub result: String,
    #[allow(dead_code)]
    pub command_string: String,
    pub response_string: String,
    pub response_status: Option<ResponseStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ResponseStatus {
    pub error_code: String,
    pub message: String,
}

/// Client for the APCC mount-control HTTP API. Raw mount protocol
/// strings go through the `sendcmd` mediator endpoint.
#[derive(Debug, Clone)]
pub struct ApccClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApccClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{host}:{port}"),
            client: reqwest::Client::new(),
        }
    }

    /// Sends a raw mount protocol command and returns the mount's reply.
    pub async fn send_command(&self, command: &str) -> Result<SendCommandResponse, ApccError> {
        let url = format!("{}/api/mount/sendcmd", self.base_url);
        let body = SendCommand {
            reg_value: "0".to_string(),
            command: command.to_string(),
        };

        log::debug!("Request: POST {url}");
        log::trace!("Sending mount command: {command}");
        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        log::debug!("Response status code: {status}");
        let text = response.text().await?;
        log::trace!("Response body: {text}");
        if !status.is_success() {
            return Err(ApccError::Server { status: status.as_u16(), message: text });
        }

        let parsed: SendCommandResponse =
            serde_json::from_str(&text).map_err(|e| ApccError::Parse(e.to_string()))?;
        if !parsed.success {
            let message = parsed
                .response_status
                .as_ref()
                .map(|s| format!("{} ({})", s.message, s.error_code))
                .unwrap_or_else(|| parsed.result.clone());
            return Err(ApccError::CommandFailed { command: command.to_string(), message });
        }
        Ok(parsed)
    }

    /// Polls the API root once per second until APCC answers. Returns
    /// false if cancellation arrived before it did.
    pub async fn wait_for_api_ready(&self, cancel: &CancelToken) -> bool {
        loop {
            match self.client.get(format!("{}/", self.base_url)).send().await {
                Ok(_) => return true,
                Err(e) => {
                    log::trace!("APCC not yet answering on API; trying again... ({e})");
                }
            }
            if cancel.sleep(Duration::from_secs(1)).await {
                return false;
            }
        }
    }
}
