// src/web/mw_auth.rs
use crate::{
    error::AppError,
    services::token_service::{Claims, TokenService},
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

// Middleware que exige um token válido no cabeçalho Authorization.
// Sem cabeçalho -> 403; token inválido ou expirado -> 401.
pub async fn require_auth(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map(str::trim));

    let raw = match header {
        None | Some(Ok("")) => {
            tracing::debug!("Autenticação MW: pedido sem token.");
            return Err(AppError::MissingToken);
        }
        Some(Ok(raw)) => raw,
        Some(Err(_)) => return Err(AppError::InvalidToken),
    };

    let claims = tokens.verify(raw)?;
    tracing::debug!(
        "Autenticação MW: utilizador {} ({}) autenticado.",
        claims.id,
        claims.role
    );

    // Os handlers protegidos leem a identidade das extensões
    request.extensions_mut().insert(AuthUser(claims));
    Ok(next.run(request).await)
}

/// Identidade verificada do autor do pedido.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);
