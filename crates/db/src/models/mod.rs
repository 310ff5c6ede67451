//! Database row structs and their conversions into domain entities.

pub mod petition;
pub mod signature;
