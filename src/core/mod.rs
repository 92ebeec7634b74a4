// src/core/mod.rs
pub mod gesture;
pub mod security;
pub mod services;
