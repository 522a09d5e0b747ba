//! Permission guard for protected routes.
//!
//! Extracts the bearer token from the Authorization header, verifies it with
//! the [`JwtValidator`], checks that the required permission is granted and
//! injects the verified [`Claims`] into request extensions for handlers.

use crate::auth::{Claims, JwtValidator};
use crate::errors::{ApiError, AuthError};
use crate::observability::metrics::record_auth_decision;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use common::bearer::{extract_bearer, BearerError};
use std::sync::Arc;
use tracing::instrument;

/// Message for a verified token that carries no `permissions` claim.
pub const PERMISSIONS_MISSING_MESSAGE: &str = "Permissions not included in token";

/// Message for a verified token that lacks the required permission.
pub const PERMISSION_NOT_FOUND_MESSAGE: &str = "Permission not found";

/// State for one guarded route: the validator and the permission it demands.
#[derive(Clone)]
pub struct PermissionGuard {
    pub jwt_validator: Arc<JwtValidator>,
    pub permission: &'static str,
}

/// Wrap a method router so that every request must carry `permission`.
///
/// ```rust,ignore
/// Router::new().route(
///     "/drinks-detail",
///     guarded(validator.clone(), "get:drinks-detail", get(handlers::list_drinks_detail)),
/// )
/// ```
pub fn guarded<S>(
    jwt_validator: Arc<JwtValidator>,
    permission: &'static str,
    router: MethodRouter<S>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(
        PermissionGuard {
            jwt_validator,
            permission,
        },
        require_permission,
    ))
}

/// Authorization guard middleware.
///
/// # Response
///
/// - 401 with `WWW-Authenticate` if the header is missing or malformed, or
///   the token fails verification
/// - 403 if the token is valid but does not grant the permission
/// - 500 if the issuer's key set cannot be fetched
/// - Otherwise runs the wrapped handler with `Claims` in extensions
#[instrument(skip_all, name = "drinks.middleware.auth", fields(permission = guard.permission))]
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authorize(&guard, req.headers()).await?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

async fn authorize(guard: &PermissionGuard, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = bearer_token(headers).map_err(|err| {
        tracing::debug!(target: "drinks.middleware.auth", code = err.code(), "Rejected Authorization header");
        record_auth_decision(guard.permission, err.code());
        ApiError::from(err)
    })?;

    let claims = guard.jwt_validator.validate(token).await.map_err(|err| {
        tracing::debug!(target: "drinks.middleware.auth", code = err.code(), "Token verification failed");
        record_auth_decision(guard.permission, err.code());
        ApiError::from(err)
    })?;

    check_permission(&claims, guard.permission).inspect_err(|_| {
        tracing::info!(
            target: "drinks.middleware.auth",
            claims = ?claims,
            "Token lacks required permission"
        );
        record_auth_decision(guard.permission, "forbidden");
    })?;

    record_auth_decision(guard.permission, "allowed");
    Ok(claims)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str())
        .transpose()
        .map_err(|_| AuthError::MalformedHeader(BearerError::InvalidCharacters.to_string()))?;

    extract_bearer(header).map_err(|err| match err {
        BearerError::Missing => AuthError::MissingToken,
        other => AuthError::MalformedHeader(other.to_string()),
    })
}

/// 403 unless `claims` grants `permission`.
pub fn check_permission(claims: &Claims, permission: &str) -> Result<(), ApiError> {
    match claims.permissions.as_deref() {
        None | Some([]) => Err(ApiError::Forbidden(PERMISSIONS_MISSING_MESSAGE.to_string())),
        Some(_) if claims.has_permission(permission) => Ok(()),
        Some(_) => Err(ApiError::Forbidden(
            PERMISSION_NOT_FOUND_MESSAGE.to_string(),
        )),
    }
}
