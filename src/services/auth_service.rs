// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, RegisterPayload, Role, User},
    services::{token_service::TokenService, user_service},
};
use sqlx::SqlitePool;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt (custo {})...", cost);
        bcrypt::hash(&password, cost)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Resultado de um login bem-sucedido.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Confere email + senha e emite um token.
pub async fn login(
    db_pool: &SqlitePool,
    tokens: &TokenService,
    email: &str,
    password: &str,
) -> AppResult<LoginOutcome> {
    let user = user_service::find_user_by_email(db_pool, &email.trim().to_lowercase())
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;

    if !verify_password(password, &user.password_hash).await? {
        tracing::warn!("Senha incorreta para: {}", user.email);
        return Err(AppError::InvalidCredentials);
    }

    let token = tokens.issue(&user)?;
    tracing::info!("✅ Login bem-sucedido para: {} ({})", user.email, user.role);
    Ok(LoginOutcome { token, user })
}

/// Valida o pedido de registo. Professores precisam de RA e curso;
/// para os restantes papéis esses campos são descartados.
pub fn validate_registration(payload: RegisterPayload) -> AppResult<NewUser> {
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Nome, e-mail e senha são obrigatórios".to_string(),
        ));
    }

    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") => Role::User,
        Some(raw) => raw.parse::<Role>().map_err(AppError::Validation)?,
    };

    let non_empty = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let (ra, curso) = if role == Role::Professor {
        match (non_empty(payload.ra), non_empty(payload.curso)) {
            (Some(ra), Some(curso)) => (Some(ra), Some(curso)),
            _ => {
                return Err(AppError::Validation(
                    "RA e curso são obrigatórios para professores".to_string(),
                ))
            }
        }
    } else {
        (None, None)
    };

    Ok(NewUser {
        name,
        email,
        password: payload.password,
        role,
        ra,
        curso,
    })
}

/// O registo público só cria alunos; professores e admins exigem
/// o token de um administrador no cabeçalho Authorization.
pub fn authorize_role_assignment(
    tokens: &TokenService,
    role: Role,
    authorization: Option<&str>,
) -> AppResult<()> {
    if role == Role::User {
        return Ok(());
    }

    let raw = authorization
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingToken)?;
    let claims = tokens.verify(raw)?;
    if claims.role != Role::Admin {
        tracing::warn!(
            "Utilizador {} ({}) tentou registar uma conta '{}'.",
            claims.id,
            claims.role,
            role
        );
        return Err(AppError::Forbidden(
            "Apenas administradores podem criar contas de professor ou administrador.".to_string(),
        ));
    }
    Ok(())
}

/// Regista um utilizador já validado. Não emite token: o cliente faz login a seguir.
pub async fn register(db_pool: &SqlitePool, new_user: NewUser, bcrypt_cost: u32) -> AppResult<User> {
    if user_service::find_user_by_email(db_pool, &new_user.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("E-mail já está em uso".to_string()));
    }

    let user = user_service::create_user(db_pool, &new_user, bcrypt_cost).await?;
    tracing::info!("Utilizador registado: {} ({})", user.email, user.role);
    Ok(user)
}
