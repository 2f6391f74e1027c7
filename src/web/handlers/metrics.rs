use salvo::prelude::*;
use tracing::warn;

use crate::web::metrics::format_prometheus;
use crate::web::web_state;

#[handler]
pub async fn metrics(depot: &mut Depot, res: &mut Response) {
    let stored_scans = match web_state(depot) {
        Ok(state) => match state.scans.store().count_scans().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("failed to count stored scans: {}", e);
                None
            }
        },
        Err(err) => {
            err.render(res);
            return;
        }
    };

    res.render(Text::Plain(format_prometheus(stored_scans)));
}
