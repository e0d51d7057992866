//! HTTP client for the backend collaborator endpoints.

pub mod client;

pub use client::ApiClient;
