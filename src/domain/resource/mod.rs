pub mod entity;
pub mod invariants;

pub use entity::ResourceRecord;
pub use invariants::validate_record;
