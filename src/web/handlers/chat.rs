use salvo::prelude::*;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::parse_json_body;
use crate::web::error::ApiError;
use crate::web::metrics::Metrics;
use crate::web::web_state;

#[derive(Debug, Default, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

async fn handle(req: &mut Request, depot: &Depot) -> Result<String, ApiError> {
    let state = web_state(depot)?;
    let body: ChatRequest = parse_json_body(req, state.max_body_bytes).await?;
    let message = body.message.unwrap_or_default();
    Ok(state.chat.reply(&message).await?)
}

#[handler]
pub async fn chat(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    Metrics::chat_received();

    match handle(req, depot).await {
        Ok(reply) => res.render(Json(json!({ "response": reply }))),
        Err(err) => {
            Metrics::chat_failed();
            warn!("chat request failed with {}: {}", err.status, err.message);
            err.render(res);
        }
    }
}
