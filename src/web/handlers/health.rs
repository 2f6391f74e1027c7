use salvo::prelude::*;
use serde_json::json;

use crate::web::metrics::Metrics;

#[handler]
pub async fn health_check(res: &mut Response) {
    res.render(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": Metrics::uptime_seconds(),
    })));
}
