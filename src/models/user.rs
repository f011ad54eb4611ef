// src/models/user.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

/// Papel de um utilizador. `User` corresponde ao aluno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Professor,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Professor => "professor",
            Role::User => "user",
        }
    }

    /// Admin e professor gerem workshops e alunos.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Professor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "professor" => Ok(Role::Professor),
            // O front-end antigo também enviava "aluno"/"student"
            "user" | "aluno" | "student" => Ok(Role::User),
            other => Err(format!("Role inválida: '{}'", other)),
        }
    }
}

// Representa um utilizador lido da tabela 'users'
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub ra: Option<String>,
    pub curso: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Vista pública de um utilizador (sem o hash da password).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "RA")]
    pub ra: Option<String>,
    pub curso: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            ra: user.ra.clone(),
            curso: user.curso.clone(),
        }
    }
}

/// Resumo usado dentro dos workshops (professor e alunos).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

// Corpo de POST /login
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

// Corpo de POST /register. RA e curso só são obrigatórios para professores.
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "RA", default)]
    pub ra: Option<String>,
    #[serde(default)]
    pub curso: Option<String>,
}

/// Dados já validados para inserir um utilizador.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub ra: Option<String>,
    pub curso: Option<String>,
}
