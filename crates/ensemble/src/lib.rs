//! Interactive multi-agent CLI assistants.
//!
//! Four assistants share one pattern: a line-oriented session collector
//! gathers details, a compiler turns them into per-agent prompts, and a
//! team of agents streams the answer back to the terminal.

#[macro_use]
extern crate tracing;

pub mod assistants;
pub mod config;
pub mod prompts;
pub mod session;
pub mod tools;
