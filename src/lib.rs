// src/lib.rs
// QueryGenius - natural-language business questions answered from heterogeneous data sources

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod llm;
pub mod pipeline;
pub mod sources;
pub mod store;
pub mod utils;
pub mod web;

pub use error::{QueryError, Result};
