//! Library side of the `admit` command: logging setup and store sessions.

pub mod logging;
pub mod session;
