//! CLI subcommand implementations for the reel-sweeper binary.

pub mod inspect_cmd;
pub mod output;
pub mod sweep_cmd;
