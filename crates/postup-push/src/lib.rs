//! Notification fan-out for postup.
//!
//! A [`Broadcaster`] accepts notifications without blocking and hands them
//! to a background worker. For each notification the worker runs
//! [`fan_out`]: every stored subscription gets an independent, concurrent
//! delivery attempt; endpoints the push service reports as gone are pruned,
//! other failures are logged and left alone. Delivery is at-most-once with no
//! retry.

pub mod broadcaster;
pub mod error;
pub mod fanout;
pub mod transport;

pub use broadcaster::Broadcaster;
pub use error::{DeliveryError, Error, Result};
pub use fanout::{FanOutReport, fan_out};
pub use transport::{PushTransport, VapidConfig, WebPushTransport};

#[cfg(test)]
mod testing;
