//! JSON API handlers.

pub mod location;
pub mod notifications;
pub mod posts;
