// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - Explicit SQL only

pub mod resource_repository;

pub use resource_repository::{ResourceRepository, SqliteResourceRepository};

#[cfg(test)]
pub use resource_repository::MockResourceRepository;
