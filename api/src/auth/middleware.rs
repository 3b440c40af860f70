use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts},
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::TypedHeader;
use headers::UserAgent;
use std::net::SocketAddr;
use tracing::info;
use crate::auth::claims::AuthUser;

/// Logs method, path, client address, caller and user-agent for each incoming
/// HTTP request, then the response status. CORS preflight `OPTIONS` requests
/// are passed through unlogged.
///
/// The client address is only known when the app is served with
/// `into_make_service_with_connect_info::<SocketAddr>()`; otherwise it is
/// logged as `unknown`.
///
/// ```ignore
/// use axum::Router;
/// use axum::middleware::from_fn;
/// use api::auth::middleware::log_request;
///
/// let app = Router::new().layer(from_fn(log_request));
/// ```
pub async fn log_request(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let (mut parts, body) = req.into_parts();

    if parts.method == Method::OPTIONS {
        let req = Request::from_parts(parts, body);
        return Ok(next.run(req).await);
    }

    let user_id = AuthUser::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|AuthUser(c)| c.sub);

    let ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let user_agent = TypedHeader::<UserAgent>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .map(|TypedHeader(ua)| ua.to_string());

    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();

    info!(
        method = %method,
        path = %path,
        ip = ip.as_deref().unwrap_or("unknown"),
        user = user_id.unwrap_or(0),
        user_agent = user_agent.as_deref().unwrap_or("unknown"),
        "Incoming request"
    );

    let req = Request::from_parts(parts, body);
    let response = next.run(req).await;

    info!(method = %method, path = %path, status = response.status().as_u16(), "Request completed");
    Ok(response)
}
