// src/services/user_service.rs
use crate::{
    config::AdminSeed,
    error::{AppError, AppResult},
    models::user::{NewUser, Role, User},
    services::auth_service,
};
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, ra, curso, created_at, updated_at";

/// Busca um utilizador pelo email (já normalizado em minúsculas).
pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por email: {}", email);
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))
        .bind(email)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Todos os utilizadores com um dado papel, por ordem de nome.
pub async fn list_users_by_role(db_pool: &SqlitePool, role: Role) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY name ASC, id ASC"
    ))
    .bind(role)
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Encontrados {} utilizadores com role '{}'.", users.len(), role);
    Ok(users)
}

/// Insere um utilizador (a senha é convertida em hash bcrypt aqui).
pub async fn create_user(db_pool: &SqlitePool, new_user: &NewUser, bcrypt_cost: u32) -> AppResult<User> {
    tracing::info!("Tentando criar utilizador: {}", new_user.email);
    let password_hash = auth_service::hash_password(&new_user.password, bcrypt_cost).await?;

    let result = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (name, email, password_hash, role, ra, curso)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&password_hash)
    .bind(new_user.role)
    .bind(&new_user.ra)
    .bind(&new_user.curso)
    .fetch_one(db_pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        // Dois registos simultâneos com o mesmo email: o índice UNIQUE decide
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::warn!("Falha ao criar user: email '{}' já existe.", new_user.email);
            Err(AppError::Conflict("E-mail já está em uso".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Garante que existe uma conta de administrador com o email configurado.
pub async fn ensure_admin(db_pool: &SqlitePool, seed: &AdminSeed, bcrypt_cost: u32) -> AppResult<()> {
    let email = seed.email.trim().to_lowercase();
    if find_user_by_email(db_pool, &email).await?.is_some() {
        tracing::debug!("Admin '{}' já existe.", email);
        return Ok(());
    }

    let admin = NewUser {
        name: "Administrador".to_string(),
        email,
        password: seed.password.clone(),
        role: Role::Admin,
        ra: None,
        curso: None,
    };
    create_user(db_pool, &admin, bcrypt_cost).await?;
    tracing::info!("👤 Conta de administrador '{}' criada.", admin.email);
    Ok(())
}
