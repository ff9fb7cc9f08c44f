//! Core types and the onboarding stage engine for the academy backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::OnboardingStore`]; the HTTP layer
//! drives [`onboarding::Onboarding`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod invitation;
pub mod memory;
pub mod onboarding;
pub mod profile;
pub mod stage;
pub mod store;
pub mod tenant;

pub use error::{Error, ErrorKind, Result};
