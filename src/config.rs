use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use simplecalc::UnboundPolicy;
use tracing_subscriber::filter::LevelFilter;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Full-screen terminal interface.
    Tui,
    /// Raw-mode line editor with history.
    Line,
    /// Plain prompt on stdin/stdout.
    Plain,
}

/// Interactive arithmetic calculator with variables.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Front end to start; defaults to the TUI when it is compiled in.
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Treat reading an unassigned variable as an error instead of
    /// declaring it as 0.
    #[arg(long)]
    pub strict: bool,

    /// Directory for the daily rolling log files.
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Log level for this program (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Expressions to evaluate in order; the program exits afterwards.
    pub expressions: Vec<String>,
}

impl Args {
    pub fn policy(&self) -> UnboundPolicy {
        if self.strict {
            UnboundPolicy::Reject
        } else {
            UnboundPolicy::AutoDeclare
        }
    }

    pub fn mode(&self) -> Result<Mode> {
        let mode = self.mode.unwrap_or(if cfg!(feature = "tui") {
            Mode::Tui
        } else {
            Mode::Plain
        });

        match mode {
            Mode::Tui if !cfg!(feature = "tui") => bail!("built without the `tui` feature"),
            Mode::Line if !cfg!(feature = "line") => bail!("built without the `line` feature"),
            mode => Ok(mode),
        }
    }
}
