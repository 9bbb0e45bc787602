//! Request dispatch.
//!
//! The [`Dispatcher`] turns one decoded message into exactly one
//! [`ScanResult`](crate::core::ScanResult). It classifies the target,
//! selects the URL or file backend, converts every failure (panics
//! included) into an `ERROR` result and records the outcome.

mod dispatcher;
mod request;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use request::parse_request;
