//! Core logic: agents, teams, the model client plumbing and tool
//! execution.
//!
//! An [`Agent`] is an immutable configuration record binding a role to
//! one hosted model backend and at most one callable tool. A [`Team`]
//! owns an ordered set of member agents plus its own coordinator
//! backend; which members get invoked, and in what order, is decided by
//! the coordinator model itself, not by code in this crate.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
mod error;
mod model_client;
mod team;
pub mod tool;

pub use agent::{Agent, AgentBuilder};
pub use error::RespondError;
pub use model_client::{ModelClient, ModelOutcome};
pub use team::{Team, TeamBuilder, TeamChunk, member_slug};
