//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply role checks before writes reach storage.

pub mod occurrence_service;

pub use occurrence_service::{NewOccurrence, OccurrenceService, ServiceError, ServiceResult};
