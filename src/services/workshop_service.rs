// src/services/workshop_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        certificate::CertificateData,
        user::{Role, UserSummary},
        workshop::{RosterRow, Workshop, WorkshopRow, WorkshopStatus},
    },
    services::{certificate_service::CertificateStore, user_service},
};
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;

const WORKSHOP_SELECT: &str = r#"
    SELECT
        w.id,
        w.name,
        w.description,
        w.status,
        w.data_finalizacao,
        w.professor_id,
        p.name  AS professor_name,
        p.email AS professor_email,
        w.created_at
    FROM workshops w
    JOIN users p ON p.id = w.professor_id
"#;

const ROSTER_SELECT: &str = r#"
    SELECT ws.workshop_id, u.id, u.name, u.email
    FROM workshop_students ws
    JOIN users u ON u.id = ws.student_id
"#;

fn workshop_not_found() -> AppError {
    AppError::NotFound("Workshop não encontrado".to_string())
}

fn student_not_found() -> AppError {
    AppError::NotFound("Estudante não encontrado".to_string())
}

pub async fn create_workshop(
    db_pool: &SqlitePool,
    professor_id: i64,
    name: &str,
    description: Option<&str>,
) -> AppResult<Workshop> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("O nome do workshop é obrigatório".to_string()));
    }
    let description = description.map(str::trim).filter(|d| !d.is_empty());

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO workshops (name, description, professor_id) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(name)
    .bind(description)
    .bind(professor_id)
    .fetch_one(db_pool)
    .await?;

    tracing::info!("Workshop {} ('{}') criado pelo utilizador {}", id, name, professor_id);
    let mut conn = db_pool.acquire().await?;
    load_workshop(&mut *conn, id).await?.ok_or_else(workshop_not_found)
}

/// Todos os workshops, com professor e alunos, por ordem de id.
pub async fn list_workshops(db_pool: &SqlitePool) -> AppResult<Vec<Workshop>> {
    let rows = sqlx::query_as::<_, WorkshopRow>(&format!("{WORKSHOP_SELECT} ORDER BY w.id ASC"))
        .fetch_all(db_pool)
        .await?;

    let roster = sqlx::query_as::<_, RosterRow>(&format!("{ROSTER_SELECT} ORDER BY u.name ASC, u.id ASC"))
        .fetch_all(db_pool)
        .await?;

    // Agrupa os alunos por workshop
    let mut by_workshop: HashMap<i64, Vec<UserSummary>> = HashMap::new();
    for row in roster {
        by_workshop.entry(row.workshop_id).or_default().push(UserSummary {
            id: row.id,
            name: row.name,
            email: row.email,
        });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let students = by_workshop.remove(&row.id).unwrap_or_default();
            Workshop::from_row(row, students)
        })
        .collect())
}

pub async fn get_workshop(db_pool: &SqlitePool, workshop_id: i64) -> AppResult<Workshop> {
    let mut conn = db_pool.acquire().await?;
    load_workshop(&mut *conn, workshop_id)
        .await?
        .ok_or_else(workshop_not_found)
}

// Lê um workshop numa conexão dada (pool ou transação)
async fn load_workshop(conn: &mut SqliteConnection, workshop_id: i64) -> AppResult<Option<Workshop>> {
    let Some(row) = sqlx::query_as::<_, WorkshopRow>(&format!("{WORKSHOP_SELECT} WHERE w.id = ?1"))
        .bind(workshop_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let students = sqlx::query_as::<_, RosterRow>(&format!(
        "{ROSTER_SELECT} WHERE ws.workshop_id = ?1 ORDER BY u.name ASC, u.id ASC"
    ))
    .bind(workshop_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|row| UserSummary {
        id: row.id,
        name: row.name,
        email: row.email,
    })
    .collect();

    Ok(Some(Workshop::from_row(row, students)))
}

async fn workshop_exists(db_pool: &SqlitePool, workshop_id: i64) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM workshops WHERE id = ?1")
        .bind(workshop_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(found.is_some())
}

/// Verifica apenas se o workshop existe (usado na listagem de certificados).
pub async fn ensure_workshop_exists(db_pool: &SqlitePool, workshop_id: i64) -> AppResult<()> {
    if workshop_exists(db_pool, workshop_id).await? {
        Ok(())
    } else {
        Err(workshop_not_found())
    }
}

/// Inscreve um aluno. Só utilizadores com papel `user` podem ser inscritos.
pub async fn add_student(db_pool: &SqlitePool, workshop_id: i64, student_id: i64) -> AppResult<()> {
    ensure_workshop_exists(db_pool, workshop_id).await?;

    let student = user_service::find_user_by_id(db_pool, student_id)
        .await?
        .ok_or_else(student_not_found)?;
    if student.role != Role::User {
        return Err(AppError::Validation(
            "O utilizador informado não é um estudante".to_string(),
        ));
    }

    let result = sqlx::query("INSERT INTO workshop_students (workshop_id, student_id) VALUES (?1, ?2)")
        .bind(workshop_id)
        .bind(student_id)
        .execute(db_pool)
        .await;

    match result {
        Ok(_) => {
            tracing::info!("Aluno {} inscrito no workshop {}", student_id, workshop_id);
            Ok(())
        }
        // Chave primária (workshop_id, student_id) já existe
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(AppError::Conflict(
            "Estudante já vinculado ao workshop".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn remove_student(db_pool: &SqlitePool, workshop_id: i64, student_id: i64) -> AppResult<()> {
    ensure_workshop_exists(db_pool, workshop_id).await?;
    if user_service::find_user_by_id(db_pool, student_id).await?.is_none() {
        return Err(student_not_found());
    }

    let result = sqlx::query("DELETE FROM workshop_students WHERE workshop_id = ?1 AND student_id = ?2")
        .bind(workshop_id)
        .bind(student_id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Estudante não vinculado ao workshop".to_string(),
        ));
    }
    tracing::info!("Aluno {} removido do workshop {}", student_id, workshop_id);
    Ok(())
}

/// Finaliza o workshop e gera um certificado por aluno.
///
/// O UPDATE condicional é a primeira escrita da transação, por isso toma o
/// lock de escrita do SQLite: finalizações concorrentes do mesmo workshop
/// esperam e depois veem `AlreadyFinalized`. A transação só é confirmada
/// depois de todos os PDFs escritos; se algum falhar, o diretório é removido
/// e o workshop continua `ativo`.
pub async fn finalize_workshop(
    db_pool: &SqlitePool,
    store: &CertificateStore,
    workshop_id: i64,
) -> AppResult<usize> {
    let mut tx = db_pool.begin().await?;
    let finalized_at = Utc::now().naive_utc();

    let updated = sqlx::query(
        r#"
        UPDATE workshops
        SET status = ?1, data_finalizacao = ?2, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?3 AND status = ?4
        "#,
    )
    .bind(WorkshopStatus::Finalizado)
    .bind(finalized_at)
    .bind(workshop_id)
    .bind(WorkshopStatus::Ativo)
    .execute(&mut *tx)
    .await?;

    let workshop = load_workshop(&mut *tx, workshop_id)
        .await?
        .ok_or_else(workshop_not_found)?;
    if updated.rows_affected() == 0 {
        return Err(AppError::AlreadyFinalized);
    }

    let certificates = certificate_batch(&workshop, finalized_at);
    let count = certificates.len();
    if let Err(e) = store.generate_all(workshop_id, certificates).await {
        tracing::error!("Falha ao gerar certificados do workshop {}: {}", workshop_id, e);
        store.discard(workshop_id).await;
        tx.rollback().await?;
        return Err(e);
    }

    tx.commit().await?;
    tracing::info!("🏁 Workshop {} finalizado com {} certificado(s)", workshop_id, count);
    Ok(count)
}

/// Regera os certificados de um workshop já finalizado a partir da lista atual
/// de alunos; certificados de alunos removidos deixam de existir.
pub async fn regenerate_certificates(
    db_pool: &SqlitePool,
    store: &CertificateStore,
    workshop_id: i64,
) -> AppResult<usize> {
    let workshop = get_workshop(db_pool, workshop_id).await?;
    let Some(finalized_at) = workshop.data_finalizacao.filter(|_| workshop.is_finalized()) else {
        return Err(AppError::Validation(
            "O workshop ainda não foi finalizado.".to_string(),
        ));
    };

    let certificates = certificate_batch(&workshop, finalized_at);
    let paths = store.replace_all(workshop_id, certificates).await?;
    Ok(paths.len())
}

fn certificate_batch(workshop: &Workshop, finalized_at: NaiveDateTime) -> Vec<CertificateData> {
    workshop
        .students
        .iter()
        .map(|student| CertificateData {
            student_id: student.id,
            student_name: student.name.clone(),
            workshop_name: workshop.name.clone(),
            professor_name: workshop.professor.name.clone(),
            finalized_at,
        })
        .collect()
}
