//! # OATH credential and code model
//!
//! A security key's OATH application hands out credentials (raw id bytes, a
//! type tag, period, issuer, account name, touch policy) and codes (a value
//! with a validity window in milliseconds). The platform side wants something
//! flatter: credentials tagged with the device they live on and identified by
//! a hex string, codes with their window in whole seconds.
//!
//! - [`oath`]: the records as the key reports them
//! - [`model`]: the presentation model
//! - [`convert`]: the conversion between the two, including the hex identity
//!   of a credential, which is stable across calls and can be persisted
//! - [`api`]: the OATH API the platform calls, forwarding to an
//!   [`api::OathViewModel`]
//! - [`authenticator`] and [`view_model`]: a software authenticator behind
//!   that view-model, used by the `oath-model` binary
//!
//! The conversion functions are pure and never fail. Everything with state
//! (access password, credential store, HOTP counters) lives in the
//! authenticator.

/// The API and the binary are somewhat untyped and just use `anyhow`;
/// typed failures are in [`error::Error`].
pub use anyhow::Result;

pub mod api;
pub mod authenticator;
pub mod cli;
pub mod convert;
pub mod error;
pub mod model;
pub mod oath;
pub mod uri;
pub mod view_model;

pub use error::Error;
