//! Client-side pieces of the wish wall.
//!
//! - [`board::PetitionBoard`]: owns the session's petition list and mirrors
//!   each mutation to the local cache and the remote store.
//! - [`cache::LocalCache`]: best-effort durable mirror with quota recovery.
//! - [`gateway::HttpPetitionGateway`]: the remote store reached over HTTP.
//! - [`relay::RelayVideoProvider`]: video generation through the server.

pub mod board;
pub mod cache;
pub mod gateway;
pub mod relay;
