use salvo::cors::{AllowOrigin, Cors, CorsHandler};
use salvo::http::header::HeaderValue;
use salvo::http::Method;
use tracing::warn;

/// Only the configured frontend origins may call the API from a browser.
pub fn cors_handler(origins: &[String]) -> CorsHandler {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    Cors::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers("content-type")
        .into_handler()
}
