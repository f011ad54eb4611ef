// src/models/workshop.rs
use crate::models::user::UserSummary;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Estado de um workshop. A única transição é `Ativo -> Finalizado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum WorkshopStatus {
    Ativo,
    Finalizado,
}

// Linha de 'workshops' já com o professor (JOIN users)
#[derive(Debug, Clone, FromRow)]
pub struct WorkshopRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: WorkshopStatus,
    pub data_finalizacao: Option<NaiveDateTime>,
    pub professor_id: i64,
    pub professor_name: String,
    pub professor_email: String,
    pub created_at: Option<NaiveDateTime>,
}

// Linha de 'workshop_students' com os dados do aluno
#[derive(Debug, Clone, FromRow)]
pub struct RosterRow {
    pub workshop_id: i64,
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Workshop com professor e alunos, no formato esperado pelo front-end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workshop {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: WorkshopStatus,
    pub data_finalizacao: Option<NaiveDateTime>,
    pub professor_id: i64,
    pub professor: UserSummary,
    pub students: Vec<UserSummary>,
    pub created_at: Option<NaiveDateTime>,
}

impl Workshop {
    pub fn from_row(row: WorkshopRow, students: Vec<UserSummary>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            status: row.status,
            data_finalizacao: row.data_finalizacao,
            professor_id: row.professor_id,
            professor: UserSummary {
                id: row.professor_id,
                name: row.professor_name,
                email: row.professor_email,
            },
            students,
            created_at: row.created_at,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.status == WorkshopStatus::Finalizado
    }
}

// Corpo de POST /workshops
#[derive(Debug, Deserialize)]
pub struct CreateWorkshopPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// Corpo de POST/DELETE /workshops/students
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPayload {
    pub workshop_id: i64,
    #[serde(alias = "selectedStudentId")]
    pub student_id: i64,
}
