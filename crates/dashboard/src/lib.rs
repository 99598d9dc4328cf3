//! Middify dashboard library.
//!
//! Server-rendered operations dashboard for the Middify order/marketplace
//! platform. Exposed as a library so the engine, client, and view logic can
//! be exercised by the integration-test crate.
//!
//! # Architecture
//!
//! - Axum web framework, Askama templates
//! - Typed reqwest client for the Middify REST backend
//! - Moka caches behind the orders query engine
//! - In-memory sessions (bearer token + per-operator view state)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod middify;
pub mod orders;
pub mod resource;
pub mod routes;
pub mod services;
pub mod state;
pub mod view;
