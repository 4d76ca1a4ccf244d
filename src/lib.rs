//! Astra - A small document store with a REST API
//!
//! This library provides users with admin-gated registration, token sessions,
//! document upload and retrieval, and a TTL cache in front of the repository.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
