//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into run-level sync and list use-cases.
//! - Keep CLI/API callers decoupled from SQL details.

pub mod sync_service;
