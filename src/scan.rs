use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::models::normalize_contact;
use crate::db::{DatabaseError, NewScan, ScanStore};
use crate::inference::{InferenceClient, InferenceError, UNKNOWN_CLASS, primary_class};

pub const MISSING_IMAGE: &str = "Missing 'image' data (base64 encoded).";
pub const MISSING_FIELDS: &str = "Missing required fields: 'fullName', 'age', 'gender'.";
pub const MAX_AGE: i64 = 150;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid input data: {0}")]
    InvalidImage(String),
    #[error("scan processing is unavailable: {0}")]
    Unavailable(String),
    #[error("Processing failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("Failed to save scan results to database: {0}")]
    Storage(#[from] DatabaseError),
}

/// Body of `POST /api/check_scan`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatientInfo {
    pub full_name: String,
    pub age: i64,
    pub gender: String,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub current: Value,
    /// Raw `result_json` of the contact's previous scan.
    pub previous: Option<String>,
}

fn parse_age(value: &Value) -> Option<i64> {
    let age = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| f as i64)
        })?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (1..=MAX_AGE).contains(&age).then_some(age)
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// Strips a `data:<mime>;base64,` prefix and embedded whitespace, then checks
/// the payload decodes. Returns the cleaned base64 text.
pub fn normalize_image(raw: &str) -> Result<String, ScanError> {
    let trimmed = raw.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ScanError::InvalidImage("malformed data URL".to_string()))?,
        None => trimmed,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(ScanError::Validation(MISSING_IMAGE.to_string()));
    }

    let decoded = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| ScanError::InvalidImage(e.to_string()))?;
    if decoded.is_empty() {
        return Err(ScanError::InvalidImage("image is empty".to_string()));
    }

    Ok(cleaned)
}

impl ScanRequest {
    /// Checks required fields in the order the API reports them.
    pub fn validate(&self) -> Result<(String, PatientInfo), ScanError> {
        let image = non_blank(self.image.as_ref())
            .ok_or_else(|| ScanError::Validation(MISSING_IMAGE.to_string()))?;

        let full_name = non_blank(self.full_name.as_ref());
        let age = self.age.as_ref().and_then(parse_age);
        let gender = non_blank(self.gender.as_ref());

        let (Some(full_name), Some(age), Some(gender)) = (full_name, age, gender) else {
            return Err(ScanError::Validation(MISSING_FIELDS.to_string()));
        };

        let image = normalize_image(&image)?;

        Ok((
            image,
            PatientInfo {
                full_name,
                age,
                gender,
                contact: normalize_contact(self.contact.as_deref()),
            },
        ))
    }
}

/// Runs inference on a submitted image and records the result.
pub struct ScanService {
    inference: Option<Arc<dyn InferenceClient>>,
    store: Arc<dyn ScanStore>,
}

impl ScanService {
    pub fn new(inference: Option<Arc<dyn InferenceClient>>, store: Arc<dyn ScanStore>) -> Self {
        Self { inference, store }
    }

    pub fn store(&self) -> Arc<dyn ScanStore> {
        self.store.clone()
    }

    pub async fn process(&self, request: ScanRequest) -> Result<ScanOutcome, ScanError> {
        let (image, patient) = request.validate()?;

        let inference = self
            .inference
            .as_ref()
            .ok_or_else(|| ScanError::Unavailable("inference client is not configured".to_string()))?;

        let current = inference.infer(&image).await?;
        info!("inference completed");

        let label = primary_class(&current);
        info!("extracted primary class: {}", label);

        // Must run before the insert below, or it would find the new row.
        let previous = match patient.contact.as_deref() {
            Some(contact) => match self.store.latest_scan_for_contact(contact).await {
                Ok(found) => found.map(|record| record.result_json),
                Err(e) => {
                    warn!("failed to fetch previous scan, continuing without it: {}", e);
                    None
                }
            },
            None => None,
        };

        let result_json = serde_json::to_string(&current).unwrap_or_else(|e| {
            warn!("error serializing inference result: {}", e);
            r#"{"error":"Result serialization failed"}"#.to_string()
        });

        let stored = self
            .store
            .insert_scan(&NewScan {
                full_name: patient.full_name,
                age: patient.age,
                gender: patient.gender,
                contact: patient.contact,
                scanned_at: Utc::now(),
                result_json,
                primary_class: Some(label),
            })
            .await?;
        info!(
            "saved scan {} ({})",
            stored.id,
            stored.primary_class.as_deref().unwrap_or(UNKNOWN_CLASS)
        );

        Ok(ScanOutcome { current, previous })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::inference::{InferenceClient, InferenceError};

    pub struct FixedInference {
        pub response: Result<Value, u16>,
        pub seen: Mutex<Vec<String>>,
    }

    impl FixedInference {
        pub fn ok(response: Value) -> Self {
            Self {
                response: Ok(response),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(status: u16) -> Self {
            Self {
                response: Err(status),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl InferenceClient for FixedInference {
        async fn infer(&self, image_b64: &str) -> Result<Value, InferenceError> {
            self.seen.lock().unwrap().push(image_b64.to_string());
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err(status) => Err(InferenceError::Api {
                    status: *status,
                    message: "upstream failure".to_string(),
                }),
            }
        }
    }
}
