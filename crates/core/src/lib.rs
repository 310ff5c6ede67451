//! Domain model and shared building blocks for the wish wall.
//!
//! Holds the petition/signature entities, the content moderation filter,
//! id and clock generation, the persistence gateway seam, and the core
//! error type. Everything here is free of HTTP and database concerns.

pub mod clock;
pub mod error;
pub mod gateway;
pub mod moderation;
pub mod petition;
pub mod types;
