mod config;
#[cfg(feature = "line")]
mod line_mode;
mod logging;
#[cfg(feature = "tui")]
mod render_help;
#[cfg(feature = "tui")]
mod tui_mode;

use std::io;

use anyhow::{bail, Result};
use clap::Parser;
use simplecalc::{console, format::format_evaluation, Calculator};
use tracing::{info, warn};

use config::{Args, Mode};

fn main() -> Result<()> {
    let args = Args::parse();
    let mode = args.mode()?;
    let batch = !args.expressions.is_empty();

    let _log_guard = logging::init_logging(&args.log_dir, args.log_level, batch || mode == Mode::Plain)?;
    info!(?mode, policy = ?args.policy(), batch, "starting");

    let mut calc = Calculator::with_policy(args.policy());

    if batch {
        return run_expressions(&mut calc, &args.expressions);
    }

    match mode {
        Mode::Plain => {
            let stdin = io::stdin();
            console::run_console(&mut calc, stdin.lock(), &mut io::stdout())
        }
        #[cfg(feature = "line")]
        Mode::Line => line_mode::run_line(calc),
        #[cfg(feature = "tui")]
        Mode::Tui => tui_mode::run_tui(calc),
        #[allow(unreachable_patterns)]
        other => bail!("{other:?} mode is not available in this build"),
    }
}

/// Evaluates command-line expressions in one session, so later ones see
/// earlier assignments.
fn run_expressions(calc: &mut Calculator, expressions: &[String]) -> Result<()> {
    let mut failed = 0;
    for expr in expressions {
        match calc.calculate(expr) {
            Ok(evaluation) => println!("{}", format_evaluation(&evaluation)),
            Err(e) => {
                warn!(expr = expr.as_str(), error = %e, "evaluation failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} expressions failed", expressions.len());
    }
    Ok(())
}
