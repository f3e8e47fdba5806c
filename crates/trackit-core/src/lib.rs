//! trackit-core library.
//!
//! Replays a dated command log against an in-memory project tracker. The
//! entry point is [`engine::run`] (or [`engine::Engine`] for step-wise
//! inspection); everything else is the model and the machinery it uses.
//!
//! # Conventions
//!
//! - **Rejections** are data: a refused command yields an
//!   [`error::Rejection`] inside its outcome, never a Rust error.
//! - **Startup errors** use `anyhow::Result` at file boundaries and
//!   [`error::LoadError`] for typed record validation.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod graph;
pub mod load;
pub mod model;
pub mod report;
pub mod timing;
pub mod validate;
