//! Shared helpers for the cqlbridge crates: clock access, ISO-8601 parsing
//! for temporal bind values, and strict text decoding of wire bytes.

pub mod misc;
pub mod time;

pub use misc::*;
pub use time::*;
