// src/web/certificate_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::certificate::CertificateLink,
    services::{certificate_service, workshop_service},
    state::AppState,
    web::extract::AppPath,
};
use axum::{
    extract::{Json, Request, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower::ServiceExt;
use tower_http::services::ServeFile;

// GET /workshops/{id}/certificates
pub async fn list_certificates(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<CertificateLink>>> {
    workshop_service::ensure_workshop_exists(&state.db_pool, id).await?;
    let names = state.certificates.list(id).await?;

    let base_url = base_url(&state, &headers);
    Ok(Json(certificate_service::certificate_links(&base_url, id, names)))
}

// GET /workshops/{id}/certificates/{filename} — o ficheiro é enviado em stream
pub async fn download_certificate(
    State(state): State<AppState>,
    AppPath((id, filename)): AppPath<(i64, String)>,
    request: Request,
) -> AppResult<Response> {
    let path = state.certificates.resolve(id, &filename).await?;
    tracing::debug!("Enviando certificado {}", path.display());

    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback(&filename),
        urlencoding::encode(&filename)
    );
    let disposition = HeaderValue::from_str(&disposition).map_err(|e| {
        tracing::error!("Content-Disposition inválido para {}: {}", filename, e);
        AppError::InternalServerError
    })?;

    let served = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let mut response = served.into_response();
    if response.status().is_success() {
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok(response)
}

// POST /workshops/{id}/certificates — regera os PDFs de um workshop finalizado
pub async fn regenerate_certificates(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<impl IntoResponse> {
    let count = workshop_service::regenerate_certificates(&state.db_pool, &state.certificates, id).await?;
    Ok(Json(json!({ "message": "Certificados gerados novamente.", "certificates": count })))
}

fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.public_base_url {
        return base.clone();
    }
    headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .map(|host| format!("http://{}", host))
        .unwrap_or_default()
}

// Nome só com ASCII imprimível para clientes que ignoram filename*
fn ascii_fallback(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect()
}
