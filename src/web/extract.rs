// src/web/extract.rs
//! Extractores com rejeição em `AppError`, para que corpo ou rota mal
//! formados também respondam `{ "message": ... }`.
use crate::error::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// `axum::Json` com rejeição JSON.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` com rejeição JSON.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
