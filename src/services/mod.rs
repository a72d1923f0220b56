// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod extraction_service;
pub mod extraction_types;

#[cfg(test)]
mod extraction_service_tests;

pub use extraction_service::ExtractionService;

pub use extraction_types::{
    ExtractionRequest,
    PipelineError,
    PipelineStage,
    SubtitleSummary,
};
