// src/models/certificate.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Dados impressos num certificado.
#[derive(Debug, Clone)]
pub struct CertificateData {
    pub student_id: i64,
    pub student_name: String,
    pub workshop_name: String,
    pub professor_name: String,
    pub finalized_at: NaiveDateTime,
}

/// Entrada devolvida por GET /workshops/{id}/certificates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificateLink {
    pub name: String,
    pub url: String,
}
