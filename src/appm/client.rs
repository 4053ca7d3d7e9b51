use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::appm::types::{
    MappingPointsResult, MappingRunStatusResult, MeasurementConfigurationRequest,
    MeasurementConfigurationResult, PointCountResult,
};
use crate::cancel::CancelToken;

#[derive(Debug, Error)]
pub enum AppmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("APPM returned status {status}: {message}")]
    Server { status: u16, message: String },
}

/// Client for the APPM point-mapper HTTP API.
#[derive(Debug, Clone)]
pub struct AppmClient {
    base_url: String,
    client: reqwest::Client,
}

impl AppmClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            base_url: format!("http://{host}:{port}"),
            client: reqwest::Client::new(),
        }
    }

    pub async fn start(&self) -> Result<(), AppmError> {
        self.put_empty("/api/MappingRun/Start").await
    }

    pub async fn stop(&self) -> Result<(), AppmError> {
        self.put_empty("/api/MappingRun/Stop").await
    }

    /// Tells APPM to exit.
    pub async fn close(&self) -> Result<(), AppmError> {
        self.put_empty("/api/Close").await
    }

    pub async fn status(&self) -> Result<MappingRunStatusResult, AppmError> {
        self.get("/api/MappingRun/Status").await
    }

    #[allow(dead_code)]
    pub async fn point_count(&self) -> Result<PointCountResult, AppmError> {
        self.get("/api/MappingPoints/PointCount").await
    }

    #[allow(dead_code)]
    pub async fn mapping_points(&self) -> Result<MappingPointsResult, AppmError> {
        self.get("/api/MappingPoints").await
    }

    pub async fn get_configuration(&self) -> Result<MeasurementConfigurationResult, AppmError> {
        self.get("/api/MappingPoints/Configuration").await
    }

    pub async fn set_configuration(
        &self,
        request: &MeasurementConfigurationRequest,
    ) -> Result<MeasurementConfigurationResult, AppmError> {
        self.put("/api/MappingPoints/Configuration", request).await
    }

    /// Polls the API root once per second until APPM answers. Returns
    /// false if cancellation arrived before it did.
    pub async fn wait_for_api_ready(&self, cancel: &CancelToken) -> bool {
        loop {
            match self.client.get(format!("{}/", self.base_url)).send().await {
                Ok(_) => return true,
                Err(e) => {
                    log::trace!("APPM not yet answering on API; trying again... ({e})");
                }
            }
            if cancel.sleep(Duration::from_secs(1)).await {
                return false;
            }
        }
    }

    /// Polls the run status once per second until the mapping run enters
    /// `state`. None if cancelled first.
    pub async fn wait_for_mapping_state(
        &self,
        state: &str,
        cancel: &CancelToken,
    ) -> Result<Option<MappingRunStatusResult>, AppmError> {
        loop {
            let status = self.status().await?;
            if status.status.mapping_run_state == state {
                return Ok(Some(status));
            }
            log::debug!(
                "MappingRunState={}, want: {state}",
                status.status.mapping_run_state
            );
            if cancel.sleep(Duration::from_secs(1)).await {
                return Ok(None);
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppmError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("Request: GET {url}");
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppmError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("Request: PUT {url}");
        if let Ok(json) = serde_json::to_string(body) {
            log::trace!("Request body: {json}");
        }
        let response = self.client.put(&url).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn put_empty(&self, path: &str) -> Result<(), AppmError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("Request: PUT {url}");
        let response = self.client.put(&url).body("").send().await?;
        let status = response.status();
        log::debug!("Response status code: {status}");
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppmError::Server { status: status.as_u16(), message });
        }
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppmError> {
        let status = response.status();
        log::debug!("Response status code: {status}");
        let body = response.text().await?;
        log::trace!("Response body: {body}");
        if !status.is_success() {
            return Err(AppmError::Server { status: status.as_u16(), message: body });
        }
        serde_json::from_str(&body).map_err(|e| AppmError::Parse(e.to_string()))
    }
}
