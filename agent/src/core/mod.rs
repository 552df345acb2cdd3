//! Pure, deterministic logic with no I/O dependencies.

pub mod danger;
pub mod message;
pub mod protocol;
