// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};
use tracing::{info, warn};

const JWT_SECRET_FILE: &str = "/run/secrets/jwt_secret";

/// Configuração lida do ambiente (e de um `.env` opcional) no arranque.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub certificates_dir: PathBuf,
    pub public_base_url: Option<String>,
    pub bcrypt_cost: u32,
    pub admin_seed: Option<AdminSeed>,
}

/// Conta de administrador criada no arranque, se ainda não existir.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = load_secret("JWT_SECRET", JWT_SECRET_FILE)?;
        if jwt_secret.len() < 32 {
            warn!("⚠️ JWT_SECRET é curta, considere usar uma chave mais longa e aleatória!");
        }

        let admin_seed = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => {
                warn!("ADMIN_EMAIL e ADMIN_PASSWORD devem ser definidas em conjunto; ignorando.");
                None
            }
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| "sqlite://oficina.db".into()),
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            jwt_secret,
            token_ttl_secs: try_load("TOKEN_TTL_SECS", "3600")?,
            certificates_dir: var("CERTIFICATES_DIR")
                .unwrap_or_else(|| "certificates".into())
                .into(),
            public_base_url: var("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
            bcrypt_cost: try_load("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())?,
            admin_seed,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> AppResult<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} não definida, usando valor padrão: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| AppError::ConfigError(format!("Valor inválido para {key} ('{raw}'): {e}")))
}

// A variável de ambiente tem prioridade; senão lê o ficheiro de secrets.
fn load_secret(key: &str, path: &str) -> AppResult<String> {
    if let Some(secret) = var(key) {
        return Ok(secret);
    }

    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ConfigError(format!("{key} não definida e {path} indisponível")))
}
