// src/services/mod.rs
pub mod auth_service;
pub mod certificate_service;
pub mod pdf_service;
pub mod token_service;
pub mod user_service;
pub mod workshop_service;
