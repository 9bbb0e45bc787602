//! Structured-output extraction.
//!
//! The sandbox executable prints progress text followed by one JSON object
//! carrying a `status` key. This module recovers that object from the
//! combined output.

mod balanced;

pub use balanced::{extract_object, extract_result, parse_object, STATUS_MARKER};
