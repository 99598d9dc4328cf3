//! Middify core library.
//!
//! Shared domain types used across the dashboard: type-safe identifiers,
//! money with es-CL rendering, the Middify order-state vocabulary, and the
//! locale formatting helpers every view relies on.
//!
//! This crate performs no I/O.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod format;
pub mod types;

pub use types::credential::BearerToken;
pub use types::id::{OrderId, TenantId};
pub use types::money::Money;
pub use types::status::OrderState;
