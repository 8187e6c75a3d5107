//! Command implementations for the trailpack CLI.

pub mod encode;
pub mod info;

pub use encode::cmd_encode;
pub use info::cmd_info;
