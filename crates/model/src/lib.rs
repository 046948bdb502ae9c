//! An abstraction layer for hosted model backends.
//!
//! This crate establishes a unified protocol between the assistants and
//! the hosted models they call, so an agent can be bound to any backend
//! (xAI, OpenRouter, a local fake) without changing the core crates.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
