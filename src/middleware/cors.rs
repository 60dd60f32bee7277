use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderValue},
        Method, Request, Response, StatusCode,
    },
    middleware::Next,
};
use tracing::debug;

use crate::{app::AppState, app_config::AppConfig};

/// Which origins get CORS headers
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    /// Reflect any origin. Only honoured outside production.
    pub reflect_any: bool,
}

impl CorsPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        let has_wildcard = config.cors_allowed_origins.iter().any(|o| o == "*");
        Self {
            allowed_origins: config
                .cors_allowed_origins
                .iter()
                .filter(|o| o.as_str() != "*")
                .cloned()
                .collect(),
            reflect_any: has_wildcard && !config.is_production(),
        }
    }

    pub fn allowed_origin(&self, origin: Option<&str>) -> Option<String> {
        let origin = origin?;
        if self.reflect_any {
            debug!("CORS: Reflecting origin for staging/dev: {}", origin);
            return Some(origin.to_string());
        }
        if self.allowed_origins.iter().any(|o| o == origin) {
            Some(origin.to_string())
        } else {
            debug!("CORS: Origin not in whitelist: {}", origin);
            None
        }
    }
}

fn insert_origin_headers(response: &mut Response<Body>, allowed: &str) {
    if let Ok(value) = HeaderValue::from_str(allowed) {
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }
}

/// Dynamic CORS middleware: whitelist in production, origin reflection elsewhere when `*` is configured
pub async fn dynamic_cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let allowed_origin = state.cors.allowed_origin(origin);

    // Handle preflight OPTIONS requests
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());

        if let Some(allowed) = allowed_origin {
            insert_origin_headers(&mut response, &allowed);
            let headers = response.headers_mut();
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("content-type, authorization, accept, origin, x-requested-with"),
            );
            headers.insert(
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static("3600"),
            );
        }

        *response.status_mut() = StatusCode::NO_CONTENT;
        return response;
    }

    let mut response = next.run(req).await;
    if let Some(allowed) = allowed_origin {
        insert_origin_headers(&mut response, &allowed);
    }

    response
}
