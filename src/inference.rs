use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod roboflow;

pub use self::roboflow::RoboflowClient;

pub const UNKNOWN_CLASS: &str = "Unknown";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference service is not configured: {0}")]
    NotConfigured(String),
    #[error("inference request failed: {0}")]
    Network(String),
    #[error("inference service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to decode inference response: {0}")]
    Decode(String),
}

/// A hosted image model that accepts a base64 image and answers with JSON.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(&self, image_b64: &str) -> Result<Value, InferenceError>;
}

/// Picks the label to store alongside a raw inference result.
///
/// Detection responses carry a `predictions` array and the most confident
/// entry wins. Classification responses either carry a `predictions` map
/// keyed by label, a `top` label, or are a bare array whose first element is
/// taken as-is.
pub fn primary_class(result: &Value) -> String {
    match result {
        Value::Object(obj) => {
            match obj.get("predictions") {
                Some(Value::Array(predictions)) if !predictions.is_empty() => {
                    // min_by on the reversed ordering keeps the earliest entry among ties
                    return predictions
                        .iter()
                        .min_by(|a, b| confidence(b).total_cmp(&confidence(a)))
                        .and_then(class_of)
                        .unwrap_or_else(|| UNKNOWN_CLASS.to_string());
                }
                Some(Value::Object(labels)) if !labels.is_empty() => {
                    return labels
                        .iter()
                        .max_by(|(_, a), (_, b)| confidence(a).total_cmp(&confidence(b)))
                        .map(|(label, _)| label.clone())
                        .unwrap_or_else(|| UNKNOWN_CLASS.to_string());
                }
                _ => {}
            }

            obj.get("top")
                .and_then(Value::as_str)
                .filter(|top| !top.is_empty())
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| UNKNOWN_CLASS.to_string())
        }
        Value::Array(items) => items
            .first()
            .and_then(class_of)
            .unwrap_or_else(|| UNKNOWN_CLASS.to_string()),
        _ => UNKNOWN_CLASS.to_string(),
    }
}

fn confidence(prediction: &Value) -> f64 {
    prediction
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

fn class_of(prediction: &Value) -> Option<String> {
    prediction
        .get("class")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}
