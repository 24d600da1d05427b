use std::time::{Duration, Instant};

use metrics::histogram;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::ServiceError;
use crate::services::payload::EventPayload;
use crate::services::settings::SettingsService;

const USER_AGENT: &str = "MRP-Event-Bridge/1.0";

/// Posts operation events to the configured endpoint. Fails closed: any
/// problem (no URL, network error, non-200 status, non-JSON body) comes back
/// as `(false, None)`, never as an error to the caller.
#[derive(Clone)]
pub struct BridgeTransport {
    client: reqwest::Client,
    settings: SettingsService,
}

impl BridgeTransport {
    pub fn new(settings: SettingsService) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap();

        Self { client, settings }
    }

    /// Delivers one payload. Returns whether the endpoint accepted it and
    /// the acknowledgement body when it did.
    #[instrument(skip(self, payload), fields(sub_mo_id = payload.sub_mo_id, kind = %payload.status))]
    pub async fn send(&self, payload: &EventPayload) -> (bool, Option<Value>) {
        match self.post_payload(payload).await {
            Ok(ack) => (true, Some(ack)),
            Err(e) => {
                warn!("Operation event delivery failed: {}", e);
                (false, None)
            }
        }
    }

    async fn post_payload(&self, payload: &EventPayload) -> Result<Value, ServiceError> {
        let url = self.settings.endpoint_url().await?;
        if url.trim().is_empty() {
            return Err(ServiceError::ExternalServiceError(
                "Bridge endpoint URL is not configured".to_string(),
            ));
        }
        let timeout_secs = self.settings.timeout_secs().await?;

        let body = serde_json::to_string(payload)
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        debug!("Posting operation event to {}: {}", url, body);

        let started_at = Instant::now();
        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(timeout_secs))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("Request to {} failed: {}", url, e))
            })?;
        histogram!(
            "bridge_delivery_duration_seconds",
            started_at.elapsed().as_secs_f64()
        );

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ServiceError::ExternalServiceError(format!(
                "Endpoint returned status {}",
                status
            )));
        }

        let ack: Value = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("Endpoint returned non-JSON body: {}", e))
        })?;
        debug!("Endpoint acknowledged: {}", ack);

        Ok(ack)
    }
}
