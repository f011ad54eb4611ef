// src/error.rs
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de configuração: {0}")]
    ConfigError(String),

    #[error("Erro de I/O: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Erro ao assinar token: {0}")]
    TokenSigningError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro ao gerar PDF: {0}")]
    PdfError(#[from] lopdf::Error),

    // --- Pedidos mal formados ---
    #[error("Corpo do pedido inválido: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("Parâmetro de rota inválido: {0}")]
    PathRejection(#[from] PathRejection),

    // --- Erros de autenticação / autorização ---
    #[error("Token não fornecido no cabeçalho Authorization")]
    MissingToken,

    #[error("Token inválido ou expirado")]
    InvalidToken,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    // --- Erros de domínio ---
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("O workshop já está finalizado.")]
    AlreadyFinalized,

    #[error("Erro interno inesperado")]
    InternalServerError,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingToken | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidToken | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::Validation(_)
            | AppError::AlreadyFinalized
            | AppError::JsonRejection(_)
            | AppError::PathRejection(_) => StatusCode::BAD_REQUEST,
            AppError::SqlxError(_)
            | AppError::SqlxMigrateError(_)
            | AppError::ConfigError(_)
            | AppError::IoError(_)
            | AppError::PasswordHashingError
            | AppError::TokenSigningError(_)
            | AppError::PdfError(_)
            | AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem devolvida ao cliente. Os detalhes internos ficam só no log.
    fn user_message(&self) -> String {
        match self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                "Erro ao aceder aos dados.".to_string()
            }
            AppError::ConfigError(_) => "Erro de configuração.".to_string(),
            AppError::IoError(_) | AppError::PdfError(_) => {
                "Erro ao processar os certificados.".to_string()
            }
            AppError::PasswordHashingError => "Erro ao processar credenciais.".to_string(),
            AppError::TokenSigningError(_) => "Erro ao gerar token.".to_string(),
            AppError::InternalServerError => "Erro interno no servidor.".to_string(),
            AppError::JsonRejection(_) => {
                "Dados do pedido inválidos ou incompletos.".to_string()
            }
            AppError::PathRejection(_) => "Parâmetro de rota inválido.".to_string(),
            other => other.to_string(),
        }
    }
}

// Como converter AppError numa resposta HTTP (JSON: { "message": ... })
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Erro processado: {:?}", self);
        } else {
            tracing::warn!("Pedido recusado ({}): {}", status.as_u16(), self);
        }

        (status, Json(json!({ "message": self.user_message() }))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
