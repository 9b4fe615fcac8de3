//! ragchat is a terminal client for a retrieval-augmented-generation backend.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation log, the streaming transport, chunk
//!   decoding and the submission state machine.
//! - [`ui`] renders conversation snapshots and runs the interactive loop.
//! - [`cli`] parses arguments and dispatches into the other layers.
//! - [`api`] defines the request and response payloads of the backend.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
