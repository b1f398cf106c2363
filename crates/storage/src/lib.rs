//! Persistence for per-student properties, including the progress record.

pub mod repository;
pub mod sqlite;
