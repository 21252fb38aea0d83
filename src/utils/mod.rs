// src/utils/mod.rs

pub mod export;
pub mod hash;
pub mod html;
pub mod jwt;
