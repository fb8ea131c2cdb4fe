//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into transactional use-cases.
//! - Keep request-handling layers decoupled from storage details.

pub mod catalog_service;
pub mod profile_service;
pub mod reconcile;
