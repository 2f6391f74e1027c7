use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use super::{InferenceClient, InferenceError};
use crate::config::InferenceConfig;

/// Client for the hosted Roboflow inference API.
///
/// The hosted endpoint takes the base64 image as a form-encoded body and the
/// API key as a query parameter.
pub struct RoboflowClient {
    client: Client,
    api_url: String,
    model_id: String,
    api_key: SecretString,
}

impl RoboflowClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| InferenceError::NotConfigured("missing inference api_key".to_string()))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model_id: config.model_id.trim_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.api_url, self.model_id)
    }
}

#[async_trait]
impl InferenceClient for RoboflowClient {
    async fn infer(&self, image_b64: &str) -> Result<Value, InferenceError> {
        let url = self.endpoint();
        debug!("running inference against model {}", self.model_id);

        let response = self
            .client
            .post(&url)
            .query(&[("api_key", self.api_key.expose_secret())])
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(image_b64.to_string())
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .or_else(|| v.get("error"))
                        .and_then(Value::as_str)
                        .map(ToOwned::to_owned)
                })
                .unwrap_or(body);
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| InferenceError::Decode(e.to_string()))
    }
}
