//! Request logging and CORS

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderValue, Method, header::HeaderName},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::{config::CorsConfig, metrics};

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = get_client_ip(&request);
    // Route template keeps trade ids out of metric labels
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = duration.as_millis(),
        client_ip = %client_ip,
        "Request processed"
    );

    metrics::record_http_request(
        method.as_str(),
        &route,
        status.as_u16(),
        duration.as_secs_f64(),
    );

    response
}

/// CORS layer factory
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_credentials(config.allow_credentials)
        .max_age(Duration::from_secs(config.max_age_seconds));

    // Wildcard origin cannot be combined with credentials, so mirror instead
    if config.allowed_origins.iter().any(|o| o == "*") {
        cors = if config.allow_credentials {
            cors.allow_origin(AllowOrigin::mirror_request())
        } else {
            cors.allow_origin(Any)
        };
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin '{}'", origin);
                    None
                }
            })
            .collect();
        cors = cors.allow_origin(AllowOrigin::list(origins));
    }

    let methods: Result<Vec<Method>, _> = config
        .allowed_methods
        .iter()
        .map(|method| method.parse::<Method>())
        .collect();

    match methods {
        Ok(methods) => cors = cors.allow_methods(methods),
        Err(e) => warn!("Invalid CORS method list: {}", e),
    }

    let headers: Result<Vec<HeaderName>, _> = config
        .allowed_headers
        .iter()
        .map(|header| header.parse::<HeaderName>())
        .collect();

    match headers {
        Ok(headers) => cors = cors.allow_headers(headers),
        Err(e) => warn!("Invalid CORS header list: {}", e),
    }

    cors
}

/// Extract client IP from request
fn get_client_ip(request: &Request) -> String {
    let headers = request.headers();

    if let Some(first_ip) = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        return first_ip.trim().to_string();
    }

    if let Some(real_ip) = headers.get("X-Real-IP").and_then(|v| v.to_str().ok()) {
        return real_ip.to_string();
    }

    "unknown".to_string()
}
