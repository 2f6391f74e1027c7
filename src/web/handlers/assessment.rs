use salvo::prelude::*;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::parse_json_body;
use crate::quiz::{AssessmentReport, ConversationMessage};
use crate::web::error::ApiError;
use crate::web::metrics::Metrics;
use crate::web::web_state;

pub const INVALID_CONVERSATION: &str = "Conversation must be a non-empty list.";
const NO_INTERPRETATION: &str = "No interpretation available.";

fn conversation_from(body: Value) -> Result<Vec<ConversationMessage>, ApiError> {
    let conversation = match body {
        Value::Object(mut map) => map.remove("conversation"),
        _ => None,
    };

    match conversation {
        Some(Value::Array(items)) if !items.is_empty() => {
            serde_json::from_value(Value::Array(items)).map_err(|e| {
                ApiError::bad_request(format!("Invalid conversation message: {}", e))
            })
        }
        _ => Err(ApiError::bad_request(INVALID_CONVERSATION)),
    }
}

async fn handle(req: &mut Request, depot: &Depot) -> Result<AssessmentReport, ApiError> {
    let state = web_state(depot)?;
    let body: Value = parse_json_body(req, state.max_body_bytes).await?;
    let conversation = conversation_from(body)?;
    Ok(state.assessor.assess(&conversation).await?)
}

#[handler]
pub async fn risk_assessment(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    Metrics::assessment_received();

    match handle(req, depot).await {
        Ok(report) => {
            info!(
                "risk assessment completed: score {} ({})",
                report.total_score, report.risk_level
            );
            let interpretation = if report.interpretation.is_empty() {
                NO_INTERPRETATION.to_string()
            } else {
                report.interpretation.clone()
            };
            res.render(Json(json!({
                "risk_assessment_result": interpretation,
                "report": report,
            })));
        }
        Err(err) => {
            Metrics::assessment_failed();
            warn!(
                "risk assessment failed with {}: {}",
                err.status, err.message
            );
            err.render(res);
        }
    }
}

#[handler]
pub async fn quiz(depot: &mut Depot, res: &mut Response) {
    match web_state(depot) {
        Ok(state) => res.render(Json(state.assessor.script().public_view())),
        Err(err) => err.render(res),
    }
}
