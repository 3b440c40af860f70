//! Capability guards.
//!
//! Each guard authenticates the caller, stores the `AuthUser` in the request
//! extensions for handlers, and checks one capability of the caller's role
//! before the request reaches the engine.

use crate::auth::claims::AuthUser;
use crate::response::{ApiResponse, ErrorResponse};
use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use services::capability::Capability;

type GuardRejection = ErrorResponse;

/// Helper to extract, validate user from request extensions and insert the back into the request
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), GuardRejection> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    let (req, _user) = extract_and_insert_authuser(req).await?;

    Ok(next.run(req).await)
}

/// Base capability guard that the named guards below build upon.
async fn allow_capability_base(
    req: Request<Body>,
    next: Next,
    capability: Capability,
) -> Result<Response, GuardRejection> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if user.0.role.can(capability) {
        Ok(next.run(req).await)
    } else {
        tracing::warn!(
            user_id = user.0.sub,
            role = %user.0.role,
            capability = %capability,
            "capability check failed"
        );
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(format!(
                "Role '{}' may not perform '{}'",
                user.0.role, capability
            ))),
        ))
    }
}

/// Lecturers, staff and admins issuing QR sessions.
pub async fn require_issue_session(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::IssueSession).await
}

/// Students scanning a QR session.
pub async fn require_scan_session(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::ScanSession).await
}

pub async fn require_campus_tap(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::CampusTap).await
}

/// Manual entries, amendments and deletions of attendance records.
pub async fn require_manual_override(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::ManualOverride).await
}

pub async fn require_view_others(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::ViewOthers).await
}

pub async fn require_work_check(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::WorkCheck).await
}

pub async fn require_manage_shifts(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::ManageShifts).await
}

pub async fn require_manage_geofences(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::ManageGeofences).await
}

pub async fn require_manage_schedules(
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardRejection> {
    allow_capability_base(req, next, Capability::ManageSchedules).await
}
