//! Location services for postup.
//!
//! - [`MapboxGeocoder`] turns a post's coordinates into place names.
//! - [`IpLocator`] guesses an observer's position from their IP address.
//!
//! Both are best-effort: neither is ever allowed to fail the request that
//! uses it.

pub mod error;
pub mod locate;
pub mod reverse;

pub use error::{Error, Result};
pub use locate::{IpLocator, ObserverLocation};
pub use reverse::MapboxGeocoder;
