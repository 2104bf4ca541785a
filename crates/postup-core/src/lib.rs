//! Core types and trait definitions for postup.
//!
//! This crate holds the anonymous-identity model, the post and subscription
//! types, input validation, and the active-post visibility query. It is free
//! of HTTP and database dependencies; storage, geocoding and push delivery
//! are reached through the traits in [`store`].

// Native `async fn` in traits; the `Send` bounds are spelled out on the trait
// signatures instead.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod geo;
pub mod notification;
pub mod post;
pub mod posts;
pub mod session;
pub mod store;
pub mod subscription;
pub mod validation;
pub mod visibility;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
