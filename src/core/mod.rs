// src/core/mod.rs
//! Backend access shared by the guard, the aggregator and the resume viewer

pub mod api_client;
pub mod error;

pub use api_client::ApiClient;
pub use error::ApiError;
