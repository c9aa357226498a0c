//! Restline - resource routing and incremental HTTP response consumption.
//!
//! Core library for route dispatch and streamed response parsing.

pub mod channel;
pub mod config;
pub mod http;
pub mod resource;
pub mod sample;
