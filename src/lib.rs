//! GCG Hub - Dokument och bedömning för god bolagsstyrning
//!
//! Checklistor, organisationsstruktur, uppladdade bevis och
//! GCG-bedömningar, allt uppdelat per räkenskapsår (tahun buku).

pub mod models;
pub mod db;
pub mod api;
pub mod services;
pub mod cli;
pub mod utils;

// Re-exports
pub use api::{GcgBackend, LocalBackend};
pub use db::Database;
pub use models::*;
pub use services::GcgHub;
pub use utils::{AppError, AppResult};
