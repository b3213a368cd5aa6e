//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate storage, bus and collaborator calls into use-case APIs.
//! - Keep callers decoupled from SQLite, wire and HTTP details.

pub mod category_service;
pub mod ledger_service;
pub mod presence_service;
pub mod summary_service;
