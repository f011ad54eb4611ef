// src/web/workshop_handlers.rs
use crate::{
    error::AppResult,
    models::workshop::{CreateWorkshopPayload, RosterPayload, Workshop},
    services::workshop_service,
    state::AppState,
    web::{
        extract::{AppJson, AppPath},
        mw_auth::AuthUser,
    },
};
use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

// POST /workshops — o dono é quem faz o pedido
pub async fn create_workshop(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    AppJson(payload): AppJson<CreateWorkshopPayload>,
) -> AppResult<impl IntoResponse> {
    let workshop = workshop_service::create_workshop(
        &state.db_pool,
        claims.id,
        &payload.name,
        payload.description.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Workshop criado com sucesso!", "workshop": workshop })),
    ))
}

// GET /workshops
pub async fn list_workshops(State(state): State<AppState>) -> AppResult<Json<Vec<Workshop>>> {
    Ok(Json(workshop_service::list_workshops(&state.db_pool).await?))
}

// GET /workshops/{id}
pub async fn get_workshop(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Workshop>> {
    Ok(Json(workshop_service::get_workshop(&state.db_pool, id).await?))
}

// POST /workshops/students
pub async fn add_student(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RosterPayload>,
) -> AppResult<impl IntoResponse> {
    workshop_service::add_student(&state.db_pool, payload.workshop_id, payload.student_id).await?;
    Ok(Json(json!({ "message": "Alunos adicionados ao workshop com sucesso." })))
}

// DELETE /workshops/students
pub async fn remove_student(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RosterPayload>,
) -> AppResult<impl IntoResponse> {
    workshop_service::remove_student(&state.db_pool, payload.workshop_id, payload.student_id).await?;
    Ok(Json(json!({ "message": "Estudante removido do workshop com sucesso." })))
}

// POST /workshops/{id}/finalize
pub async fn finalize_workshop(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    tracing::info!("Utilizador {} pediu a finalização do workshop {}", claims.id, id);
    let count = workshop_service::finalize_workshop(&state.db_pool, &state.certificates, id).await?;

    Ok(Json(json!({
        "message": "Workshop finalizado com sucesso! Certificados gerados.",
        "certificates": count,
    })))
}
