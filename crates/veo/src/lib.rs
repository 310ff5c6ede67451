//! Image-to-video generation against the Veo generative video API.
//!
//! Provides the provider seam ([`provider::VideoProvider`]), a REST client
//! for the hosted API ([`api::VeoApi`]), the submit/poll/retrieve state
//! machine ([`workflow::VideoWorkflow`]), and a same-origin byte relay for
//! the finished media ([`proxy::MediaProxy`]).

pub mod api;
pub mod config;
pub mod operation;
pub mod provider;
pub mod proxy;
pub mod workflow;
