use salvo::http::header::CONTENT_TYPE;
use salvo::prelude::*;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::web::error::ApiError;

pub mod assessment;
pub mod chat;
pub mod health;
pub mod metrics;
pub mod scan;

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Rejects non-JSON bodies with 415 before parsing within `max_size`.
pub(crate) async fn parse_json_body<T>(req: &mut Request, max_size: usize) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    if !is_json(req) {
        return Err(ApiError::unsupported_media_type());
    }

    req.parse_json_with_max_size::<T>(max_size)
        .await
        .map_err(|e| {
            debug!("rejecting request body: {}", e);
            ApiError::bad_request(format!("Invalid JSON body: {}", e))
        })
}
