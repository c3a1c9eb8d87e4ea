//! Version and welcome-banner constants, plus the `clap` CLI surface.

use std::path::PathBuf;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "scheme";
pub const WELCOME_SUBTITLE: &str = "an R5RS-subset interpreter";

/// Run a script file, or drop into the REPL when none is given.
#[derive(clap::Parser, Debug)]
#[command(name = "scheme")]
#[command(version = VERSION)]
#[command(about = WELCOME_SUBTITLE)]
pub struct CliArgs {
    /// Script file to execute. Omit to start the REPL.
    #[arg(value_name = "FILE")]
    pub script: Option<PathBuf>,
}
