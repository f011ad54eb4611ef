// src/web/mod.rs
pub mod auth_handlers;
pub mod certificate_handlers;
pub mod extract;
pub mod mw_auth;
pub mod mw_staff;
pub mod routes;
pub mod workshop_handlers;
