// src/services/token_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Conteúdo do token: identidade do utilizador + validade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Emite e valida tokens HS256. O segredo vem da configuração.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Valida o valor do cabeçalho Authorization ("Bearer <token>" ou o token puro).
    pub fn verify(&self, header_value: &str) -> AppResult<Claims> {
        let token = strip_bearer(header_value);
        if token.is_empty() {
            return Err(AppError::InvalidToken);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejeitado: {}", e);
                AppError::InvalidToken
            })
    }
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    }
}
