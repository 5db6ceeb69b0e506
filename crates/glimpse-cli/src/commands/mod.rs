//! Command implementations. Each module exposes an `execute` function.

pub mod detect;
pub mod inject;
pub mod serve;

pub use detect::execute as detect_execute;
pub use inject::execute as inject_execute;
pub use serve::execute as serve_execute;
