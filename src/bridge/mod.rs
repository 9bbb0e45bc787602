//! The bridge loop.
//!
//! A [`Bridge`] owns one framed channel. It reads a request, dispatches
//! it, writes exactly one response and only then reads the next request.
//! End of stream stops the loop cleanly; a broken channel stops it with a
//! [`BridgeError`].

mod session;

pub use session::{Bridge, BridgeError, BridgeStats, OVERSIZED_RESPONSE_DETAILS};
