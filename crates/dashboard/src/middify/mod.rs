//! Middify backend REST client.
//!
//! The backend exposes five bearer-authenticated JSON endpoints (tenant
//! order-states, marketplace summary, user profile, order details, paged
//! orders). This module owns the typed wire schemas, the boundary
//! normalization rules, and the error taxonomy.
//!
//! Cancellation is not an error: callers abort an in-flight request by
//! dropping its future (the resource layer aborts superseded tasks), so a
//! cancelled call never produces a user-visible failure.

mod client;
pub mod conversions;
pub mod types;

pub use client::{MiddifyClient, OrdersByStateQuery};

use thiserror::Error;

/// Errors that can occur when talking to the Middify backend.
#[derive(Debug, Error)]
pub enum MiddifyError {
    /// No bearer token supplied; checked before any network I/O.
    #[error("authentication token not provided")]
    MissingCredential,

    /// Non-2xx response. The message comes from the backend's
    /// `{success:false, message}` envelope when one was parseable,
    /// otherwise it is the generic `Error <status>`.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// 2xx response whose envelope reported `success:false`.
    #[error("backend reported failure: {0}")]
    Api(String),

    /// Response body did not match the expected top-level shape.
    #[error("malformed backend response: {0}")]
    Malformed(String),

    /// Connection-level failure (DNS, TLS, timeouts, aborted sockets).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl MiddifyError {
    /// HTTP status carried by the error, when one exists.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
