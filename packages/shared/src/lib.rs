//! Utilities shared by the Yoriai binaries: logging setup and clocks.

pub mod logger;
pub mod time;
