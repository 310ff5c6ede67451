//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument and return raw `sqlx::Error`s.

pub mod petition_repo;
pub mod signature_repo;

pub use petition_repo::PetitionRepo;
pub use signature_repo::SignatureRepo;
