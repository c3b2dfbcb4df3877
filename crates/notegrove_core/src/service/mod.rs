//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine decisions and repository calls into use-case APIs.
//! - Keep UI layers decoupled from storage and engine internals.

pub mod organizer_service;
