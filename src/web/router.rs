use salvo::affix_state;
use salvo::prelude::*;

use crate::web::WebState;
use crate::web::handlers::{
    assessment::{quiz, risk_assessment},
    chat::chat,
    health::health_check,
    metrics::metrics,
    scan::check_scan,
};

pub fn create_router(state: WebState) -> Router {
    Router::new()
        .hoop(affix_state::inject(state))
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("metrics").get(metrics))
        .push(
            Router::with_path("api")
                .push(Router::with_path("check_scan").post(check_scan))
                .push(
                    Router::with_path("risk-assessment")
                        .post(risk_assessment)
                        .push(Router::with_path("quiz").get(quiz)),
                )
                .push(Router::with_path("chat").post(chat)),
        )
}
