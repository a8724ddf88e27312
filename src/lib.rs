//! # parakh
//!
//! Client for the policy-guardian backend: the HTTP transport layer and the
//! state holders behind the chat widget, the courtroom debate viewer and the
//! admin console. All auditing, debate generation and request approval
//! happen on the backend; this crate sends requests and keeps the state the
//! presentation layer renders.

pub mod config;
pub mod net;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ClientConfig;
pub use net::api::ApiClient;
pub use net::{ApiError, Backend};
