//! Admin actions: excluding URLs from, and including them back into,
//! integrity enforcement.
//!
//! Requests are explicit values ([`ActionRequest`] plus the acting
//! [`Session`](sri_nonce::Session)) rather than ambient request state, and
//! token checking is delegated to an injected
//! [`TokenValidator`](sri_nonce::TokenValidator).

mod action;
pub mod error;
mod processor;
mod request;

pub use crate::action::{Action, NONCE_ACTION};
pub use crate::processor::{Outcome, Processor};
pub use crate::request::{ActionRequest, nonce_param};
