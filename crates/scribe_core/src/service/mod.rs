//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Parse caller-facing date strings into typed timestamps.

pub mod entry_service;
pub mod rule_service;
