// src/handlers/mod.rs

pub mod auth;
pub mod quiz;
pub mod student;
pub mod subjects;
pub mod teacher;
