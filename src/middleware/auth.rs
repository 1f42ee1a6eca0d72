use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::booking::Principal;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Resolve the bearer token into a [`Principal`] request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::Unauthorized("Missing bearer token".to_string()));
    };

    let principal = state.tokens.verify(bearer.token())?.principal();
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Only admins get past this layer; it must sit inside `auth_middleware`.
pub async fn require_admin(request: Request, next: Next) -> AppResult<Response> {
    match request.extensions().get::<Principal>().copied() {
        Some(principal) if principal.is_admin() => Ok(next.run(request).await),
        Some(principal) => {
            tracing::warn!(user_id = %principal.user_id, "admin route denied");
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
        None => Err(AppError::Unauthorized("No authentication found".to_string())),
    }
}
