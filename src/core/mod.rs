pub mod accumulator;
pub mod chat_stream;
pub mod config;
pub mod constants;
pub mod controller;
pub mod conversation;
pub mod decoder;
pub mod error;
pub mod message;
