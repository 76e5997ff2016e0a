//! Library crate for courtside-back: the match session engine, its sensory
//! feedback, and the HTTP shell that hosts one session court-side.

pub mod config;
pub mod dto;
pub mod error;
pub mod feedback;
pub mod routes;
pub mod services;
pub mod state;
