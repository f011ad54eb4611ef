// src/web/mw_staff.rs
use crate::{error::AppError, web::mw_auth::AuthUser};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

/// Middleware que só deixa passar administradores e professores.
/// Deve ser executado *depois* do middleware `require_auth`.
pub async fn require_staff(
    Extension(AuthUser(claims)): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if claims.role.is_staff() {
        return Ok(next.run(request).await);
    }

    tracing::warn!(
        "Staff MW: acesso negado para {} (role '{}') em {}",
        claims.id,
        claims.role,
        request.uri().path()
    );
    Err(AppError::Forbidden(
        "Acesso negado. Apenas professores ou administradores podem realizar esta operação."
            .to_string(),
    ))
}
