// src/models/mod.rs
pub mod certificate;
pub mod user;
pub mod workshop;
