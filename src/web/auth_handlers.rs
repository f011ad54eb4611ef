// src/web/auth_handlers.rs
use crate::{
    error::AppResult,
    models::user::{LoginPayload, RegisterPayload, Role, UserView},
    services::{auth_service, user_service},
    state::AppState,
    web::extract::AppJson,
};
use axum::{
    extract::{Json, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Tentativa de login para: {}", payload.email);

    let outcome =
        auth_service::login(&state.db_pool, &state.tokens, &payload.email, &payload.password).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Login realizado com sucesso",
            "token": outcome.token,
            "user": UserView::from(&outcome.user),
        })),
    ))
}

// POST /register (não devolve token; o cliente faz login depois).
// Contas de professor ou admin só com token de administrador.
pub async fn handle_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    let new_user = auth_service::validate_registration(payload)?;

    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    auth_service::authorize_role_assignment(&state.tokens, new_user.role, authorization)?;

    let user = auth_service::register(&state.db_pool, new_user, state.bcrypt_cost).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Usuário registrado com sucesso",
            "user": UserView::from(&user),
        })),
    ))
}

// GET /professors — lista vazia quando não há professores
pub async fn list_professors(State(state): State<AppState>) -> AppResult<Json<Vec<UserView>>> {
    list_by_role(&state, Role::Professor).await
}

// GET /students
pub async fn list_students(State(state): State<AppState>) -> AppResult<Json<Vec<UserView>>> {
    list_by_role(&state, Role::User).await
}

async fn list_by_role(state: &AppState, role: Role) -> AppResult<Json<Vec<UserView>>> {
    let users = user_service::list_users_by_role(&state.db_pool, role).await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}
