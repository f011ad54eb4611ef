// src/state.rs
use crate::{
    config::Config,
    services::{certificate_service::CertificateStore, token_service::TokenService},
};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub tokens: TokenService,
    pub certificates: CertificateStore,
    pub bcrypt_cost: u32,
    // Base usada nos URLs de download; None -> deduzida do cabeçalho Host
    pub public_base_url: Option<String>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: &Config) -> Self {
        Self {
            db_pool,
            tokens: TokenService::new(config.jwt_secret.as_bytes(), config.token_ttl_secs),
            certificates: CertificateStore::new(config.certificates_dir.clone()),
            bcrypt_cost: config.bcrypt_cost,
            public_base_url: config.public_base_url.clone(),
        }
    }
}

// Permite extrair o pool da DB diretamente
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> TokenService {
        state.tokens.clone()
    }
}
