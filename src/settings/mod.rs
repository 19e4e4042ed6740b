//! Settings come from a TOML file (`--settings`, or the per-profile default)
//! layered with `ROTATOR__SECTION__KEY` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
