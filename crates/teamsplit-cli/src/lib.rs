// Library root: re-exports the front-end modules so integration tests can
// drive the same pipeline the binary runs.

pub mod command;
pub mod config;
pub mod roster;
