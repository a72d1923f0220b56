// src/extraction/mod.rs
//
// Extraction Adapter
//
// Turns a URL into a typed MetadataDocument.
//
// RULES:
// - Read-only with respect to the resource
// - Raw tool output never leaves this module untyped
// - Optional fields degrade, required fields fail

pub mod schema;
pub mod traits;
pub mod ytdlp;

pub use schema::parse_metadata;
pub use traits::MetadataExtractor;
pub use ytdlp::YtDlpExtractor;
