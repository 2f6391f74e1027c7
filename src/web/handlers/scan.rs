use salvo::prelude::*;
use tracing::{info, warn};

use super::parse_json_body;
use crate::scan::{ScanOutcome, ScanRequest};
use crate::web::error::ApiError;
use crate::web::metrics::Metrics;
use crate::web::web_state;

async fn handle(req: &mut Request, depot: &Depot) -> Result<ScanOutcome, ApiError> {
    let state = web_state(depot)?;
    let request: ScanRequest = parse_json_body(req, state.max_body_bytes).await?;
    Ok(state.scans.process(request).await?)
}

#[handler]
pub async fn check_scan(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    Metrics::scan_received();

    match handle(req, depot).await {
        Ok(outcome) => {
            Metrics::scan_success();
            info!(
                "scan processed (previous result: {})",
                if outcome.previous.is_some() { "found" } else { "none" }
            );
            res.render(Json(outcome));
        }
        Err(err) => {
            Metrics::scan_failed();
            warn!("scan request failed with {}: {}", err.status, err.message);
            err.render(res);
        }
    }
}
